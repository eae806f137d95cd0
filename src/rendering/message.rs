//! Timed dialogue reveal.

use super::Presenter;
use crate::game::{plain_text, RevealingText, TextLine};
use crate::CrustResult;
use tokio::time::sleep;

/// Shows a message, revealing it character by character, and returns once
/// the player dismisses it.
///
/// Dismissing while text is still revealing warps the reveal to the end and
/// closes the message.
pub async fn show_message(presenter: &dyn Presenter, lines: &[TextLine]) -> CrustResult<()> {
    let mut reveal = RevealingText::new(lines);
    presenter.message_opened(&plain_text(lines));

    let dismissed = presenter.wait_for_dismiss();
    tokio::pin!(dismissed);

    let mut early = false;
    while let Some((_, delay)) = reveal.reveal_next() {
        tokio::select! {
            biased;
            _ = &mut dismissed => {
                early = true;
                break;
            }
            _ = sleep(delay) => {}
        }
    }

    reveal.warp_to_done();
    presenter.message_revealed(&reveal.revealed());
    if !early {
        dismissed.await;
    }
    presenter.message_closed();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Speed;
    use crate::rendering::HeadlessPresenter;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_before_reveal_finishes() -> CrustResult<()> {
        let presenter = HeadlessPresenter::new();
        let start = Instant::now();
        show_message(&presenter, &[TextLine::new("Hello there", Speed::Slow)]).await?;
        assert!(start.elapsed() < Duration::from_millis(90 * 10));
        assert_eq!(presenter.messages(), vec!["Hello there".to_string()]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_dismissal_after_reveal() -> CrustResult<()> {
        let presenter = HeadlessPresenter::new().with_dismiss_delay(Duration::from_secs(5));
        let start = Instant::now();
        show_message(&presenter, &[TextLine::new("Hi", Speed::Fast)]).await?;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        Ok(())
    }
}
