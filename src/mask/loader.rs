//! 异步遮罩加载
//!
//! 遮罩解码在 tokio 任务中完成，不占用模拟热路径。结果通过共享
//! 槽位发布；槽位为 `None` 时（未加载、加载中或加载失败），依赖
//! 它的模拟器退化为无约束行为。
//!
//! 取消语义：每次请求递增代号，任务提交结果前检查代号是否仍是
//! 最新——配置变更后，过期的加载结果被直接丢弃，不会覆盖更新的
//! 采样器。

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use super::MaskSampler;
use crate::impl_default_and_new;

/// 共享的可空采样器槽位
///
/// 模拟器持有克隆并在每帧读取；读取是廉价的 `Arc` 克隆。
#[derive(Clone, Default)]
pub struct MaskSlot {
    inner: Arc<Mutex<Option<Arc<MaskSampler>>>>,
}

impl MaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前采样器，未就绪时为 `None`
    pub fn get(&self) -> Option<Arc<MaskSampler>> {
        self.inner.lock().unwrap().clone()
    }

    fn set(&self, sampler: Option<Arc<MaskSampler>>) {
        *self.inner.lock().unwrap() = sampler;
    }
}

/// 遮罩加载器
///
/// 一个加载器对应一个遮罩槽位；重复请求会使先前未完成的加载失效。
pub struct MaskLoader {
    slot: MaskSlot,
    generation: Arc<AtomicU64>,
}

impl_default_and_new!(MaskLoader {
    slot: MaskSlot::new(),
    generation: Arc::new(AtomicU64::new(0)),
});

impl MaskLoader {
    /// 模拟器侧的槽位句柄
    pub fn slot(&self) -> MaskSlot {
        self.slot.clone()
    }

    /// 请求从文件加载遮罩
    ///
    /// 读取与解码都在任务中进行，必须在 tokio 运行时内调用。
    /// 失败时槽位置为 `None`，消费者退化为无约束行为，不向上
    /// 传播错误。
    pub fn request(&self, path: PathBuf) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let slot = self.slot.clone();

        tokio::spawn(async move {
            let sampler = match tokio::fs::read(&path).await {
                Ok(bytes) => match MaskSampler::from_bytes(&bytes) {
                    Ok(sampler) => Some(Arc::new(sampler)),
                    Err(e) => {
                        tracing::warn!(target: "mask", "Failed to decode mask {:?}: {}", path, e);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(target: "mask", "Failed to read mask {:?}: {}", path, e);
                    None
                }
            };

            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(target: "mask", "Discarding stale mask load for {:?}", path);
                return;
            }
            slot.set(sampler);
        })
    }

    /// 请求从已有字节解码遮罩（来源不在文件系统时使用）
    pub fn request_bytes(&self, bytes: Vec<u8>) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let slot = self.slot.clone();

        tokio::spawn(async move {
            let sampler = match MaskSampler::from_bytes(&bytes) {
                Ok(sampler) => Some(Arc::new(sampler)),
                Err(e) => {
                    tracing::warn!(target: "mask", "Failed to decode mask bytes: {}", e);
                    None
                }
            };

            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(target: "mask", "Discarding stale mask decode");
                return;
            }
            slot.set(sampler);
        })
    }

    /// 清空槽位并使未完成的加载失效
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.slot.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskChannel;
    use std::io::Write;

    /// 1x1 白色 PNG
    fn white_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        image::DynamicImage::ImageRgba8(image)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&white_png()).unwrap();
        file.flush().unwrap();

        let loader = MaskLoader::new();
        let slot = loader.slot();
        assert!(slot.get().is_none());

        loader.request(file.path().to_path_buf()).await.unwrap();

        let sampler = slot.get().expect("sampler should be ready");
        assert_eq!(sampler.sample(0.0, 0.0, MaskChannel::R), 1.0);
    }

    #[tokio::test]
    async fn test_load_failure_resolves_to_none() {
        let loader = MaskLoader::new();
        let slot = loader.slot();

        loader
            .request(PathBuf::from("/nonexistent/mask.png"))
            .await
            .unwrap();

        assert!(slot.get().is_none());
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let loader = MaskLoader::new();
        let slot = loader.slot();

        // 第一次请求完成前发起第二次请求：clear() 使其失效
        let handle = loader.request_bytes(white_png());
        loader.clear();
        handle.await.unwrap();

        // 过期结果不得提交
        assert!(slot.get().is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_resolves_to_none() {
        let loader = MaskLoader::new();
        let slot = loader.slot();

        loader.request_bytes(vec![0, 1, 2, 3]).await.unwrap();

        assert!(slot.get().is_none());
    }
}
