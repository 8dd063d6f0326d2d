//! 标注持久化接收端：每次已提交的变更都会把当前线格式列表推给宿主。

use chartlab_core::annotation::entity::WireAnnotation;
use chartlab_core::annotation::error::SinkError;
use chartlab_core::annotation::port::AnnotationSink;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// # Summary
/// 内存接收端，保留最近一次写入及写入次数。
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<(Vec<WireAnnotation>, usize)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次写入的内容。
    pub fn latest(&self) -> Vec<WireAnnotation> {
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.0.clone()
    }

    pub fn writes(&self) -> usize {
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.1
    }
}

impl AnnotationSink for MemorySink {
    fn persist(&self, drawings: &[WireAnnotation]) -> Result<(), SinkError> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.0 = drawings.to_vec();
        guard.1 += 1;
        Ok(())
    }
}

/// # Summary
/// JSON 文件接收端。
///
/// # Invariants
/// - 先写临时文件再重命名，读者不会看到写了一半的文件。
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnnotationSink for JsonFileSink {
    fn persist(&self, drawings: &[WireAnnotation]) -> Result<(), SinkError> {
        let body =
            serde_json::to_vec_pretty(drawings).map_err(|e| SinkError::Serialize(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SinkError::Io(e.to_string()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| SinkError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| SinkError::Io(e.to_string()))?;
        Ok(())
    }
}

/// # Summary
/// 读取已保存的标注列表。
///
/// # Returns
/// 文件不存在视为没有已保存的标注，返回空列表。
pub fn load_drawings(path: &Path) -> Result<Vec<WireAnnotation>, SinkError> {
    let body = match std::fs::read(path) {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SinkError::Io(e.to_string())),
    };
    serde_json::from_slice(&body).map_err(|e| SinkError::Serialize(e.to_string()))
}
