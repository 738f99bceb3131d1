//! Add command implementation.

use super::write_summary;
use cardsync_engine::{SyncController, Transport};
use std::io::Write;

/// Runs the add command.
pub async fn run<T: Transport + 'static>(
    controller: &SyncController<T>,
    question: &str,
    answer: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.load().await?;

    let pending = controller.add(question, answer)?;
    let id = pending.id().clone();
    pending.wait().await?;

    writeln!(out, "Added {id}")?;
    write_summary(out, controller.store())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{controller, output};
    use cardsync_engine::HttpMethod;

    #[tokio::test]
    async fn adds_card() {
        let controller = controller(&[]);
        let mut out = Vec::new();

        run(&controller, "Q1", "A1", &mut out).await.unwrap();

        assert_eq!(controller.transport().count(HttpMethod::Post), 1);
        assert!(output(out).ends_with("1 Flash Cards | 0 Learned\n"));
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let controller = controller(&[]);
        let mut out = Vec::new();

        assert!(run(&controller, " ", "A1", &mut out).await.is_err());
        assert_eq!(controller.transport().count(HttpMethod::Post), 0);
    }
}
