use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fleet_errors::CancelCause;

/// 分发取消信号
///
/// 由调用方在分发前创建，支持手动取消和截止时间两种触发方式。
/// worker 只拿到只读的 [`SignalListener`]，无法触发取消。
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancellationSignal {
    /// 创建没有截止时间的取消信号
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建在指定时间点自动触发的取消信号
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// 创建在给定时长后自动触发的取消信号
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// 手动触发取消，重复调用是无操作
    pub fn cancel(&self) {
        if self.token.is_cancelled() {
            debug!("取消信号已经触发过");
            return;
        }
        info!("触发分发取消信号");
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_triggered(&self) -> bool {
        self.cause().is_some()
    }

    /// 当前的取消原因，未触发时返回 `None`
    pub fn cause(&self) -> Option<CancelCause> {
        cause_of(&self.token, self.deadline)
    }

    /// 等待信号触发
    pub async fn triggered(&self) -> CancelCause {
        wait_for(&self.token, self.deadline).await
    }

    /// 创建供worker使用的只读监听器
    pub fn listener(&self) -> SignalListener {
        SignalListener {
            token: self.token.clone(),
            deadline: self.deadline,
        }
    }
}

/// 取消信号的只读视图
#[derive(Debug, Clone)]
pub struct SignalListener {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl SignalListener {
    pub fn is_triggered(&self) -> bool {
        self.cause().is_some()
    }

    pub fn cause(&self) -> Option<CancelCause> {
        cause_of(&self.token, self.deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 等待信号触发，手动取消优先于截止时间
    pub async fn triggered(&self) -> CancelCause {
        wait_for(&self.token, self.deadline).await
    }
}

fn cause_of(token: &CancellationToken, deadline: Option<Instant>) -> Option<CancelCause> {
    if token.is_cancelled() {
        return Some(CancelCause::Signal);
    }
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Some(CancelCause::Deadline),
        _ => None,
    }
}

async fn wait_for(token: &CancellationToken, deadline: Option<Instant>) -> CancelCause {
    match deadline {
        Some(deadline) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => CancelCause::Signal,
                _ = sleep_until(deadline) => CancelCause::Deadline,
            }
        }
        None => {
            token.cancelled().await;
            CancelCause::Signal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_signal_basic() {
        let signal = CancellationSignal::new();
        let listener = signal.listener();

        assert!(!signal.is_triggered());
        assert!(!listener.is_triggered());
        assert_eq!(listener.deadline(), None);

        signal.cancel();

        assert_eq!(signal.cause(), Some(CancelCause::Signal));
        assert_eq!(listener.cause(), Some(CancelCause::Signal));
    }

    #[tokio::test]
    async fn test_listener_wakes_on_cancel() {
        let signal = CancellationSignal::new();
        let listener = signal.listener();

        let waiter = tokio::spawn(async move { listener.triggered().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();

        let cause = timeout(Duration::from_millis(100), waiter)
            .await
            .expect("listener should wake up")
            .unwrap();
        assert_eq!(cause, CancelCause::Signal);
    }

    #[tokio::test]
    async fn test_double_cancel() {
        let signal = CancellationSignal::new();
        signal.cancel();
        signal.cancel();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let signal = CancellationSignal::new();
        let cloned = signal.clone();

        cloned.cancel();

        assert!(signal.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_triggers() {
        let signal = CancellationSignal::with_timeout(Duration::from_secs(2));
        let listener = signal.listener();
        assert!(!listener.is_triggered());

        let cause = listener.triggered().await;

        assert_eq!(cause, CancelCause::Deadline);
        assert_eq!(signal.cause(), Some(CancelCause::Deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_cancel_wins_over_deadline() {
        let signal = CancellationSignal::with_timeout(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(2)).await;
        signal.cancel();

        assert_eq!(signal.cause(), Some(CancelCause::Signal));
        assert_eq!(signal.listener().triggered().await, CancelCause::Signal);
    }

    #[tokio::test]
    async fn test_elapsed_deadline_is_triggered_immediately() {
        let signal = CancellationSignal::with_deadline(Instant::now());
        assert_eq!(signal.cause(), Some(CancelCause::Deadline));
    }
}
