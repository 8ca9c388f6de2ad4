//! High-performance I/O operations
//!
//! This module provides async I/O primitives using io_uring on Linux.

use crate::Result;

#[cfg(feature = "io_uring")]
pub mod iouring {
    //! io_uring based I/O operations
    //! 
    //! Requires Linux kernel 5.1+ and the `io_uring` feature.
    
    use super::*;
    use std::os::unix::io::RawFd;
    
    /// io_uring configuration
    pub struct IoUringConfig {
        /// Number of SQ entries
        pub sq_entries: u32,
        /// Enable SQ polling (SQPOLL)
        pub sq_poll: bool,
        /// SQ poll idle time in milliseconds
        pub sq_poll_idle: u32,
    }
    
    impl Default for IoUringConfig {
        fn default() -> Self {
            Self {
                sq_entries: 4096,
                sq_poll: false,  // Requires root/CAP_SYS_ADMIN
                sq_poll_idle: 1000,
            }
        }
    }
    
    /// High-performance io_uring based I/O engine
    pub struct IoUringEngine {
        // In production, this would hold the io_uring instance
        // ring: IoUring,
        _config: IoUringConfig,
    }
    
    impl IoUringEngine {
        /// Create a new io_uring engine
        pub fn new(config: IoUringConfig) -> Result<Self> {
            // In production:
            // let ring = IoUring::builder()
            //     .setup_sqpoll(config.sq_poll_idle)
            //     .build(config.sq_entries)?;
            
            Ok(Self { _config: config })
        }
        
        /// Submit a read operation
        /// 
        /// **Status:** Not yet implemented. Use `standard::AsyncFileReader` instead.
        pub async fn read(&self, _fd: RawFd, _buf: &mut [u8], _offset: u64) -> Result<usize> {
            // io_uring implementation requires the io-uring crate and kernel 5.1+
            // For now, return an error instead of panicking
            Err(crate::Error::NotImplemented(
                "io_uring read not yet implemented. Use standard::AsyncFileReader as fallback.".into()
            ))
        }
        
        /// Submit a write operation
        /// 
        /// **Status:** Not yet implemented. Use `standard::AsyncFileWriter` instead.
        pub async fn write(&self, _fd: RawFd, _buf: &[u8], _offset: u64) -> Result<usize> {
            // io_uring implementation requires the io-uring crate and kernel 5.1+
            // For now, return an error instead of panicking
            Err(crate::Error::NotImplemented(
                "io_uring write not yet implemented. Use standard::AsyncFileWriter as fallback.".into()
            ))
        }
        
        /// Submit a batch of operations
        /// 
        /// **Status:** Not yet implemented.
        pub async fn submit_batch(&self) -> Result<usize> {
            // io_uring batch submission requires full ring implementation
            // For now, return an error instead of panicking
            Err(crate::Error::NotImplemented(
                "io_uring batch submission not yet implemented.".into()
            ))
        }
    }
}

/// Standard async I/O fallback
pub mod standard {
    use super::*;
    use tokio::fs::File;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    
    /// Standard async file reader
    pub struct AsyncFileReader {
        file: File,
    }
    
    impl AsyncFileReader {
        /// Open a file for reading
        pub async fn open(path: &str) -> Result<Self> {
            let file = File::open(path).await?;
            Ok(Self { file })
        }
        
        /// Read data into buffer
        pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            Ok(self.file.read(buf).await?)
        }
        
        /// Read entire file
        pub async fn read_all(&mut self) -> Result<Vec<u8>> {
            let mut buf = Vec::new();
            self.file.read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
    
    /// Standard async file writer
    pub struct AsyncFileWriter {
        file: File,
    }
    
    impl AsyncFileWriter {
        /// Create/open a file for writing
        pub async fn create(path: &str) -> Result<Self> {
            let file = File::create(path).await?;
            Ok(Self { file })
        }
        
        /// Write data
        pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
            Ok(self.file.write(buf).await?)
        }
        
        /// Write all data
        pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            Ok(self.file.write_all(buf).await?)
        }
        
        /// Flush to disk
        pub async fn flush(&mut self) -> Result<()> {
            Ok(self.file.flush().await?)
        }
    }
}

// Re-exports
pub use standard::{AsyncFileReader, AsyncFileWriter};

#[cfg(feature = "io_uring")]
pub use iouring::{IoUringConfig, IoUringEngine};
