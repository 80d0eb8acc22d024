use fleet_core::{CancellationSignal, Task};

/// 一次分发请求，提交后由分发器消费
#[derive(Debug)]
pub struct DispatchRequest<T> {
    tasks: Vec<T>,
    max_concurrency: i32,
    signal: CancellationSignal,
    operator: Option<String>,
}

impl<T: Task> DispatchRequest<T> {
    /// 使用永不自动触发的取消信号创建请求
    pub fn new(tasks: Vec<T>, max_concurrency: i32) -> Self {
        Self {
            tasks,
            max_concurrency,
            signal: CancellationSignal::new(),
            operator: None,
        }
    }

    pub fn with_signal(mut self, signal: CancellationSignal) -> Self {
        self.signal = signal;
        self
    }

    /// 发起分发的操作者，只用于日志关联
    pub fn with_operator<S: Into<String>>(mut self, operator: S) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn tasks(&self) -> &[T] {
        &self.tasks
    }

    pub fn max_concurrency(&self) -> i32 {
        self.max_concurrency
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, i32, CancellationSignal, Option<String>) {
        (self.tasks, self.max_concurrency, self.signal, self.operator)
    }
}
