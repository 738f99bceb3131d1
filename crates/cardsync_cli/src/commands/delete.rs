//! Delete command implementation.

use super::{parse_id, write_summary};
use cardsync_engine::{SyncController, Transport};
use std::io::Write;

/// Runs the delete command.
///
/// The card leaves the local collection after the grace interval even if
/// the server rejects the delete; the failure is then reported.
pub async fn run<T: Transport + 'static>(
    controller: &SyncController<T>,
    id: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(id)?;
    controller.load().await?;

    let (removed, confirmed) = controller.delete(&id)?.wait().await;
    removed?;
    match confirmed {
        Ok(()) => writeln!(out, "Deleted {id}")?,
        Err(e) => {
            writeln!(out, "Removed {id} locally, server delete failed")?;
            return Err(e.into());
        }
    }
    write_summary(out, controller.store())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{card, controller, output};
    use cardsync_engine::HttpMethod;

    #[tokio::test(start_paused = true)]
    async fn deletes_card() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        let mut out = Vec::new();

        run(&controller, &c.id.to_string(), &mut out).await.unwrap();

        assert_eq!(controller.transport().count(HttpMethod::Delete), 1);
        assert!(!controller.store().contains(&c.id));
        assert!(output(out).ends_with("0 Flash Cards | 0 Learned\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_aborts_before_delete() {
        let c = card("Q1", false);
        let controller = controller(&[c.clone()]);
        controller.transport().fail_next(1);
        let mut out = Vec::new();

        assert!(run(&controller, &c.id.to_string(), &mut out).await.is_err());
        assert!(out.is_empty());
        assert_eq!(controller.transport().count(HttpMethod::Delete), 0);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let controller = controller(&[]);
        let mut out = Vec::new();
        assert!(run(&controller, "42", &mut out).await.is_err());
        assert_eq!(controller.transport().request_count(), 0);
    }
}
