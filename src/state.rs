use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::decision::StateTransition;
use crate::error::{RainError, Result};
use crate::model::GeoPoint;
use crate::time_bucket::TimeBucket;

/// 降雨中であることを実行間で持ち越すための保存先
pub trait StateStore {
    fn read(&self) -> Result<Option<TimeBucket>>;
    fn write(&self, bucket: &TimeBucket) -> Result<()>;
    fn delete(&self) -> Result<()>;

    fn apply(&self, transition: &StateTransition) -> Result<()> {
        match transition {
            StateTransition::Keep => Ok(()),
            StateTransition::Write(bucket) => self.write(bucket),
            StateTransition::Delete => self.delete(),
        }
    }
}

/// 地点ごとの `latest_{lat}_{lon}.txt` に最後に雨を検知した時刻を書く
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: &Path, target: GeoPoint) -> Self {
        let filename = format!("latest_{:?}_{:?}.txt", target.lat, target.lon);
        Self {
            path: dir.join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn read(&self) -> Result<Option<TimeBucket>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        content
            .parse()
            .map(Some)
            .map_err(|_| RainError::CorruptState {
                path: self.path.display().to_string(),
                content,
            })
    }

    fn write(&self, bucket: &TimeBucket) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bucket.to_string())?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// プロセス内だけで保持する状態。ドライランとテスト用
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    latest: Mutex<Option<TimeBucket>>,
    writes: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new(initial: Option<TimeBucket>) -> Self {
        Self {
            latest: Mutex::new(initial),
            writes: Mutex::new(0),
        }
    }

    /// write と delete が呼ばれた回数
    pub fn mutations(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current(&self) -> Option<TimeBucket> {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, value: Option<TimeBucket>) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = value;
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self) -> Result<Option<TimeBucket>> {
        Ok(self.current())
    }

    fn write(&self, bucket: &TimeBucket) -> Result<()> {
        self.set(Some(*bucket));
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        self.set(None);
        Ok(())
    }
}
