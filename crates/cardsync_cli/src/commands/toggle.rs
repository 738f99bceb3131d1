//! Toggle command implementation.

use super::{parse_id, write_summary};
use cardsync_engine::{SyncController, Transport};
use std::io::Write;

/// Runs the toggle command.
pub async fn run<T: Transport + 'static>(
    controller: &SyncController<T>,
    id: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(id)?;
    controller.load().await?;

    controller.toggle_learned(&id)?.wait().await?;

    let learned = controller
        .store()
        .get(&id)
        .map(|card| card.learned)
        .unwrap_or_default();
    let state = if learned { "learned" } else { "not learned" };
    writeln!(out, "Marked {id} as {state}")?;
    write_summary(out, controller.store())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{card, controller, output};

    #[tokio::test]
    async fn toggles_learned() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        let mut out = Vec::new();

        run(&controller, &c.id.to_string(), &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("as learned"));
        assert!(text.ends_with("1 Flash Cards | 1 Learned\n"));
    }

    #[tokio::test]
    async fn failure_is_reported() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        controller.transport().set_failing(true);
        let mut out = Vec::new();

        assert!(run(&controller, &c.id.to_string(), &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let controller = controller(&[]);
        let mut out = Vec::new();
        let id = cardsync_engine::CardId::new().to_string();
        assert!(run(&controller, &id, &mut out).await.is_err());
    }
}
