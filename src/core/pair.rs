use std::ffi::OsStr;
use std::path::PathBuf;

/// 一对对应的源目录和副本目录，遍历的基本工作单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub source: PathBuf,
    pub replica: PathBuf,
}

impl DirectoryPair {
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
        }
    }

    /// 同名子项在两侧的路径
    pub fn entry(&self, name: &OsStr) -> (PathBuf, PathBuf) {
        (self.source.join(name), self.replica.join(name))
    }

    /// 同名子目录构成的下一层目录对
    pub fn child(&self, name: &OsStr) -> Self {
        let (source, replica) = self.entry(name);
        Self { source, replica }
    }
}
