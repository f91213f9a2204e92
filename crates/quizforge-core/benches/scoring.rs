use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizforge_core::model::{AnswerMap, OptionLetter, Question, QuestionType, QuizOption};
use quizforge_core::scoring::{grade, score};

fn make_questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            if i % 5 == 4 {
                Question {
                    number: i as u32 + 1,
                    text: "Explain your reasoning in detail".into(),
                    question_type: QuestionType::Essay,
                    options: vec![],
                    instructions: Some("Write at least 100 words.".into()),
                }
            } else {
                Question {
                    number: i as u32 + 1,
                    text: format!("Question {i}"),
                    question_type: QuestionType::MultipleChoice,
                    options: OptionLetter::ALL
                        .iter()
                        .map(|&letter| QuizOption {
                            letter,
                            text: format!("option {letter}"),
                            is_correct: letter == OptionLetter::ALL[i % 4],
                        })
                        .collect(),
                    instructions: None,
                }
            }
        })
        .collect()
}

fn make_answers(n: usize) -> AnswerMap {
    (0..n)
        .map(|i| (i, OptionLetter::ALL[(i * 7) % 4].to_string()))
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    for n in [10usize, 50, 500] {
        let questions = make_questions(n);
        let answers = make_answers(n);
        group.bench_function(format!("score_{n}"), |b| {
            b.iter(|| score(black_box(&questions), black_box(&answers)))
        });
        group.bench_function(format!("grade_{n}"), |b| {
            b.iter(|| grade(black_box(&questions), black_box(&answers)))
        });
    }

    group.bench_function("empty_answers", |b| {
        let questions = make_questions(50);
        let answers = AnswerMap::new();
        b.iter(|| score(black_box(&questions), black_box(&answers)))
    });

    group.finish();
}

criterion_group!(benches, bench_score);
criterion_main!(benches);
