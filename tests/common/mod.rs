#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the standard two-row orders fixture and returns its path.
    pub fn write_orders(&self) -> PathBuf {
        self.write(
            "orders.csv",
            "order_id,user_id,amount,quantity,status,created_at\n\
             1,u1,10.5,2,Paid ,2024-01-05T10:00:00Z\n\
             2,u2,250.0,1,REFUNDED,2024-02-01T08:30:00Z\n",
        )
    }

    /// Writes the standard users fixture and returns its path.
    pub fn write_users(&self) -> PathBuf {
        self.write(
            "users.csv",
            "user_id,country,signup_date\n\
             u1,US,2023-01-01\n\
             u2,DE,2023-03-15\n",
        )
    }
}
