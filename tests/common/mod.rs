#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Two formats: a Japanese-headed export and an English-headed one without
/// ordering columns. The first column names each format.
pub const MASTER: &str = "\
形式,要素内訳借方勘定科目コード,要素内訳借方勘定科目名称,要素内訳貸方勘定科目コード,要素内訳貸方勘定科目名称,借方金額,貸方金額,年,月,日,伝票No
formatA,借方科目,借方科目名,貸方科目,貸方科目名,借方金額,貸方金額,年,月,日,伝票番号
formatB,DrCode,DrName,CrCode,CrName,DrAmount,CrAmount,,,,
";

/// Three rows collapsing into two debit/credit combinations; `摘要` is unmapped.
pub const LEDGER_A: &str = "\
年,月,日,伝票番号,借方科目,借方科目名,貸方科目,貸方科目名,借方金額,貸方金額,摘要
2024,4,2,2,500,仕入,100,現金,300,300,c
2024,4,1,1,100,現金,400,売上,1000,1000,a
2024,4,1,1,100,現金,400,売上,500,500,b
";

pub const LEDGER_B: &str = "\
DrCode,DrName,CrCode,CrName,DrAmount,CrAmount
100,Cash,400,Sales,10,10
100,Cash,400,Sales,20,20
";

/// Only amount columns map, so there is nothing to group by.
pub const AMOUNTS_ONLY: &str = "\
DrAmount,CrAmount
10,10
";

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
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }

    /// Writes the two-format master and returns its path.
    pub fn master(&self) -> PathBuf {
        self.write("master.csv", MASTER)
    }
}
