use std::time::Duration;
use tokio::sync::mpsc;

/// Search input settles after this long without a new keystroke.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// One settled burst. `last` is the newest debounced value, `interrupt` the value
/// that closed the window early without being debounced itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T> {
    pub last: Option<T>,
    pub interrupt: Option<T>,
}

/// Waits for the next value on `rx`, then keeps absorbing newer values until `wait`
/// passes with nothing new. A value matching `urgent` ends the window at once and is
/// handed back as `interrupt`, after whatever had settled so far. `None` once the
/// channel is closed and drained.
pub async fn next_settled_until<T, F>(
    rx: &mut mpsc::Receiver<T>,
    wait: Duration,
    urgent: F,
) -> Option<Settled<T>>
where
    F: Fn(&T) -> bool,
{
    let first = rx.recv().await?;
    if urgent(&first) {
        return Some(Settled {
            last: None,
            interrupt: Some(first),
        });
    }

    let mut latest = first;
    loop {
        match tokio::time::timeout(wait, rx.recv()).await {
            Ok(Some(value)) if urgent(&value) => {
                return Some(Settled {
                    last: Some(latest),
                    interrupt: Some(value),
                });
            }
            Ok(Some(value)) => {
                tracing::trace!("debounce: newer value arrived, restarting window");
                latest = value;
            }
            // 通道關閉或逾時，都把最後一個值交出去
            Ok(None) | Err(_) => {
                return Some(Settled {
                    last: Some(latest),
                    interrupt: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_collapses_to_last_value() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send("l").await.unwrap();
        tx.send("la").await.unwrap();
        tx.send("lap").await.unwrap();

        let settled = next_settled_until(&mut rx, Duration::from_millis(50), |_| false).await;
        assert_eq!(settled.and_then(|s| s.last), Some("lap"));
    }

    #[tokio::test]
    async fn test_values_after_window_are_separate() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(1).await.unwrap();

        let wait = Duration::from_millis(20);
        let first = next_settled_until(&mut rx, wait, |_| false).await;
        assert_eq!(first.and_then(|s| s.last), Some(1));

        tx.send(2).await.unwrap();
        drop(tx);
        let second = next_settled_until(&mut rx, wait, |_| false).await;
        assert_eq!(second.and_then(|s| s.last), Some(2));

        assert_eq!(next_settled_until(&mut rx, wait, |_| false).await, None);
    }

    #[tokio::test]
    async fn test_urgent_value_cuts_window_short() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send("lap").await.unwrap();
        tx.send("laptop").await.unwrap();
        tx.send(":more").await.unwrap();
        tx.send(":more").await.unwrap();
        drop(tx);

        fn is_command(value: &&str) -> bool {
            value.starts_with(':')
        }
        let wait = Duration::from_millis(50);

        let first = next_settled_until(&mut rx, wait, is_command).await;
        assert_eq!(
            first,
            Some(Settled {
                last: Some("laptop"),
                interrupt: Some(":more"),
            })
        );

        // 指令不會被合併
        let second = next_settled_until(&mut rx, wait, is_command).await;
        assert_eq!(
            second,
            Some(Settled {
                last: None,
                interrupt: Some(":more"),
            })
        );
        assert_eq!(next_settled_until(&mut rx, wait, is_command).await, None);
    }
}
