//! Edit command implementation.

use super::{parse_id, write_card, write_summary};
use cardsync_engine::{SyncController, Transport};
use std::io::Write;

/// Runs the edit command.
///
/// Fields not given keep their current text.
pub async fn run<T: Transport + 'static>(
    controller: &SyncController<T>,
    id: &str,
    question: Option<String>,
    answer: Option<String>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(id)?;
    controller.load().await?;

    controller.begin_edit(&id)?;
    let draft = controller
        .store()
        .interaction(&id)
        .and_then(|state| state.draft().cloned())
        .ok_or_else(|| format!("card {id} is not being edited"))?;
    controller.edit_draft(
        &id,
        question.unwrap_or(draft.question),
        answer.unwrap_or(draft.answer),
    )?;

    let saved = match controller.save_edit(&id) {
        Ok(saved) => saved,
        Err(e) => {
            controller.cancel_edit(&id)?;
            return Err(e.into());
        }
    };

    match saved {
        Some(pending) => {
            pending.wait().await?;
            writeln!(out, "Updated {id}")?;
        }
        None => writeln!(out, "No changes to {id}")?,
    }
    if let Some(card) = controller.store().get(&id) {
        write_card(out, &card, true)?;
    }
    write_summary(out, controller.store())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{card, controller, output};
    use cardsync_engine::HttpMethod;

    #[tokio::test]
    async fn edits_question_only() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        let mut out = Vec::new();

        run(&controller, &c.id.to_string(), Some("Q2".into()), None, &mut out)
            .await
            .unwrap();

        let request = &controller.transport().requests()[1];
        assert_eq!(request.method, HttpMethod::Patch);
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["question"], "Q2");
        assert_eq!(body["answer"], c.answer);
        assert!(output(out).contains("Updated"));
    }

    #[tokio::test]
    async fn same_text_sends_nothing() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        let mut out = Vec::new();

        run(&controller, &c.id.to_string(), Some("Q1".into()), None, &mut out)
            .await
            .unwrap();

        assert_eq!(controller.transport().count(HttpMethod::Patch), 0);
        assert!(output(out).contains("No changes"));
    }

    #[tokio::test]
    async fn blank_answer_is_rejected() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        let mut out = Vec::new();

        let result = run(&controller, &c.id.to_string(), None, Some("".into()), &mut out).await;

        assert!(result.is_err());
        assert_eq!(controller.transport().count(HttpMethod::Patch), 0);
        assert!(!controller.store().interaction(&c.id).unwrap().is_editing());
    }
}
