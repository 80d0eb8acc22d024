//! 任务能力接口定义
//!
//! 分发器只依赖任务的装卸货能力，不关心任务的具体类型：
//! - `id` 用于在分发结果中唯一标识任务
//! - `load_cargo` 装货
//! - `unload_cargo` 卸货，只有装货成功后才会被调用
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use fleet_core::{CargoError, Task};
//!
//! pub struct Barge {
//!     id: String,
//!     containers: u32,
//! }
//!
//! #[async_trait]
//! impl Task for Barge {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     async fn load_cargo(&mut self) -> Result<(), CargoError> {
//!         self.containers += 4;
//!         Ok(())
//!     }
//!
//!     async fn unload_cargo(&mut self) -> Result<(), CargoError> {
//!         self.containers = 0;
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use fleet_errors::CargoError;

/// 可被分发器处理的任务
///
/// 每个任务在一次分发中只会被一个worker独占持有，
/// 因此方法签名使用 `&mut self`，实现方无需自行加锁。
#[async_trait]
pub trait Task: Send + 'static {
    /// 任务ID，同一次分发中必须唯一
    fn id(&self) -> &str;

    /// 装货
    async fn load_cargo(&mut self) -> Result<(), CargoError>;

    /// 卸货
    async fn unload_cargo(&mut self) -> Result<(), CargoError>;
}

#[async_trait]
impl<T: Task + ?Sized> Task for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    async fn load_cargo(&mut self) -> Result<(), CargoError> {
        (**self).load_cargo().await
    }

    async fn unload_cargo(&mut self) -> Result<(), CargoError> {
        (**self).unload_cargo().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Crate {
        id: String,
        cargo: i32,
    }

    #[async_trait]
    impl Task for Crate {
        fn id(&self) -> &str {
            &self.id
        }

        async fn load_cargo(&mut self) -> Result<(), CargoError> {
            self.cargo += 1;
            Ok(())
        }

        async fn unload_cargo(&mut self) -> Result<(), CargoError> {
            Err(CargoError::not_implemented(self.id.clone()))
        }
    }

    #[tokio::test]
    async fn test_boxed_task_delegates() {
        let mut boxed: Box<dyn Task> = Box::new(Crate {
            id: "C1".to_string(),
            cargo: 0,
        });

        assert_eq!(boxed.id(), "C1");
        assert!(boxed.load_cargo().await.is_ok());
        assert_eq!(
            boxed.unload_cargo().await,
            Err(CargoError::not_implemented("C1"))
        );
    }
}
