//! 内容校验 - 对文件内容计算 BLAKE3 摘要

use crate::storage::FileSystem;
use std::fmt;
use std::io::{self, Read};
use std::path::Path;

/// 流式读取的块大小
const CHUNK_SIZE: usize = 64 * 1024;

/// 文件内容摘要（32 字节 BLAKE3）
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; blake3::OUT_LEN]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; blake3::OUT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.to_hex()[..16])
    }
}

/// 计算读取流的摘要，内存占用与文件大小无关
pub fn digest_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<ContentDigest> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(ContentDigest(*hasher.finalize().as_bytes()))
}

/// 计算文件内容摘要
pub fn digest(fs: &dyn FileSystem, path: &Path) -> io::Result<ContentDigest> {
    let mut reader = fs.open_read(path)?;
    digest_reader(&mut *reader)
}
