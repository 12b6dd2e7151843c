use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Clipboard manager channel, initialized on first copy.
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Start the clipboard thread if needed.
///
/// Each copy gets its own `arboard::Clipboard` that is kept alive for a moment so
/// clipboard managers on Linux can read the selection before it is dropped.
fn init_clipboard_manager() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(&text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(Duration::from_secs(2));
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });

        tx
    })
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    init_clipboard_manager()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard manager channel closed"))
}
