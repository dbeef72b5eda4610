//! Mock exercise generator.
//!
//! Stands in for an AI content service: a canned set for the "Saludos"
//! topic, templated multiple-choice items for everything else.

use crate::lesson::Exercise;

const MULTIPLE_CHOICE: &str = "MultipleChoice";

/// Produce `count` exercises for a topic.
///
/// The "Saludos" topic always yields its fixed two-item set regardless of
/// `count`, mirroring the canned content users already know.
pub fn generate_exercises(topic: &str, count: usize) -> Vec<Exercise> {
    if topic.eq_ignore_ascii_case("saludos") {
        return vec![
            Exercise {
                kind: MULTIPLE_CHOICE.to_owned(),
                question: "¿Cómo se dice 'Hola'?".to_owned(),
                correct_answer: "Kaixo".to_owned(),
                options_json:
                    r#"["Kaixo", "Agur", "Egun on", "Arratsalde on"]"#
                        .to_owned(),
                ..Default::default()
            },
            Exercise {
                kind: MULTIPLE_CHOICE.to_owned(),
                question: "¿Cómo se dice 'Adiós'?".to_owned(),
                correct_answer: "Agur".to_owned(),
                options_json:
                    r#"["Kaixo", "Agur", "Ezkerrerik asko", "Mesedez"]"#
                        .to_owned(),
                ..Default::default()
            },
        ];
    }

    (1..=count)
        .map(|i| Exercise {
            kind: MULTIPLE_CHOICE.to_owned(),
            question: format!("Pregunta IA sobre {topic} #{i}"),
            correct_answer: "Opción A".to_owned(),
            options_json:
                r#"["Opción A", "Opción B", "Opción C", "Opción D"]"#
                    .to_owned(),
            ..Default::default()
        })
        .collect()
}
