//! Virtual filesystem switch: a single mounted filesystem, reached
//! through a small set of free functions that null-check the mount
//! before forwarding.
//!
//! https://wiki.osdev.org/VFS

pub mod fat32;

use alloc::string::String;
use alloc::vec::Vec;
use spin::RwLock;

/// A file or directory fetched out of the mounted filesystem.
pub struct File {
    pub name: String,
    pub data: Option<Vec<u8>>,
    pub size: usize,
    pub is_directory: bool,
}

/// One entry of a directory listing.
pub struct DirEntryView {
    pub name: String,
    pub size: u32,
    pub is_directory: bool,
}

/// A mountable filesystem driver.
///
/// `path` arguments are always absolute, `/`-separated, and rooted at
/// the filesystem's own root directory (the VFS itself does not
/// understand mount points beyond "one filesystem, mounted or not").
pub trait FileSystem: Sync {
    fn read(&self, path: &str, buf: &mut [u8], n: usize) -> bool;
    fn write(&self, path: &str, buf: &[u8], n: usize) -> bool;
    fn create(&self, path: &str) -> bool;
    fn mkdir(&self, path: &str) -> bool;
    fn remove(&self, path: &str) -> bool;
    fn get(&self, path: &str) -> Option<File>;
    fn getall(&self, path: &str) -> Option<Vec<DirEntryView>>;
}

static MOUNTED: RwLock<Option<&'static dyn FileSystem>> = RwLock::new(None);

pub fn mount(fs: &'static dyn FileSystem) {
    *MOUNTED.write() = Some(fs);
}

pub fn unmount() {
    *MOUNTED.write() = None;
}

pub fn is_mounted() -> bool {
    MOUNTED.read().is_some()
}

pub fn fs_read(path: &str, buf: &mut [u8], n: usize) -> bool {
    match *MOUNTED.read() {
        Some(fs) => fs.read(path, buf, n),
        None => false,
    }
}

pub fn fs_write(path: &str, buf: &[u8], n: usize) -> bool {
    match *MOUNTED.read() {
        Some(fs) => fs.write(path, buf, n),
        None => false,
    }
}

pub fn fs_create(path: &str) -> bool {
    match *MOUNTED.read() {
        Some(fs) => fs.create(path),
        None => false,
    }
}

pub fn fs_mkdir(path: &str) -> bool {
    match *MOUNTED.read() {
        Some(fs) => fs.mkdir(path),
        None => false,
    }
}

pub fn fs_remove(path: &str) -> bool {
    match *MOUNTED.read() {
        Some(fs) => fs.remove(path),
        None => false,
    }
}

pub fn fs_get(path: &str) -> Option<File> {
    MOUNTED.read().and_then(|fs| fs.get(path))
}

pub fn fs_getall(path: &str) -> Option<Vec<DirEntryView>> {
    MOUNTED.read().and_then(|fs| fs.getall(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullFs;

    impl FileSystem for NullFs {
        fn read(&self, _path: &str, _buf: &mut [u8], _n: usize) -> bool {
            false
        }
        fn write(&self, _path: &str, _buf: &[u8], _n: usize) -> bool {
            false
        }
        fn create(&self, _path: &str) -> bool {
            false
        }
        fn mkdir(&self, _path: &str) -> bool {
            false
        }
        fn remove(&self, _path: &str) -> bool {
            false
        }
        fn get(&self, _path: &str) -> Option<File> {
            None
        }
        fn getall(&self, _path: &str) -> Option<Vec<DirEntryView>> {
            None
        }
    }

    #[test_case]
    fn unmounted_calls_fail_closed_instead_of_panicking() {
        unmount();
        assert!(!fs_read("/a", &mut [0u8; 1], 1));
        assert!(!fs_create("/a"));
        assert!(fs_get("/a").is_none());
        assert!(fs_getall("/").is_none());
    }

    #[test_case]
    fn mounting_routes_calls_to_the_mounted_filesystem() {
        static FS: NullFs = NullFs;
        mount(&FS);
        assert!(is_mounted());
        assert!(!fs_read("/a", &mut [0u8; 1], 1));
        unmount();
        assert!(!is_mounted());
    }
}
