use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SOURCE_FILE_KEY: &str = "SourceFile";

pub const TIMESTAMP_TAGS: &[&str] = &["EXIF:DateTimeOriginal", "QuickTime:CreationDate"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(serde_json::Map<String, Value>);

impl MetadataRecord {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.get_str(SOURCE_FILE_KEY)
    }
}

pub trait MetadataProvider {
    fn read_metadata(&mut self, paths: &[PathBuf]) -> Result<Vec<MetadataRecord>>;
}

pub struct ExifTool {
    executable: PathBuf,
    #[cfg(windows)]
    _staging: Option<staging::StagedExifTool>,
}

impl ExifTool {
    pub fn locate(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            return Ok(Self {
                executable: path.to_path_buf(),
                #[cfg(windows)]
                _staging: None,
            });
        }

        match which::which("exiftool") {
            Ok(found) => Ok(Self {
                executable: found,
                #[cfg(windows)]
                _staging: None,
            }),
            Err(_) => Self::fallback(),
        }
    }

    #[cfg(windows)]
    fn fallback() -> Result<Self> {
        let staging = staging::StagedExifTool::download()?;
        Ok(Self {
            executable: staging.executable().to_path_buf(),
            _staging: Some(staging),
        })
    }

    #[cfg(not(windows))]
    fn fallback() -> Result<Self> {
        bail!(
            "exiftool が見つかりません。インストールして検索パスに追加してください: \
             https://exiftool.org/install.html"
        );
    }
}

impl MetadataProvider for ExifTool {
    fn read_metadata(&mut self, paths: &[PathBuf]) -> Result<Vec<MetadataRecord>> {
        let mut command = Command::new(&self.executable);
        command.arg("-j").arg("-G");
        for tag in TIMESTAMP_TAGS {
            command.arg(format!("-{tag}"));
        }
        command.args(paths);

        let output = command.output().with_context(|| {
            format!(
                "exiftool を実行できませんでした: {}",
                self.executable.display()
            )
        })?;
        if !output.status.success() {
            bail!(
                "exiftool が失敗しました ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let records = parse_records(&output.stdout)?;
        if records.len() != paths.len() {
            bail!(
                "メタデータの件数が一致しません: {}件の要求に対して{}件",
                paths.len(),
                records.len()
            );
        }
        Ok(records)
    }
}

fn parse_records(stdout: &[u8]) -> Result<Vec<MetadataRecord>> {
    serde_json::from_slice(stdout).context("exiftool の出力を解析できませんでした")
}

#[cfg(any(windows, test))]
struct SearchPathGuard {
    var: String,
    original: Option<std::ffi::OsString>,
}

#[cfg(any(windows, test))]
impl SearchPathGuard {
    #[cfg(windows)]
    fn prepend(dir: &Path) -> Result<Self> {
        Self::prepend_var("PATH", dir)
    }

    fn prepend_var(var: &str, dir: &Path) -> Result<Self> {
        use std::env;

        let original = env::var_os(var);
        let mut entries = vec![dir.to_path_buf()];
        if let Some(existing) = &original {
            entries.extend(env::split_paths(existing));
        }
        let joined = env::join_paths(entries).context("検索パスを組み立てられませんでした")?;
        env::set_var(var, joined);
        Ok(Self {
            var: var.to_string(),
            original,
        })
    }
}

#[cfg(any(windows, test))]
impl Drop for SearchPathGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => std::env::set_var(&self.var, value),
            None => std::env::remove_var(&self.var),
        }
    }
}

#[cfg(windows)]
mod staging {
    use super::SearchPathGuard;
    use anyhow::{Context, Result};
    use std::fs::File;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const EXIFTOOL_VERSION: &str = "12.67";
    const ARCHIVE_EXECUTABLE: &str = "exiftool(-k).exe";

    pub(super) struct StagedExifTool {
        executable: PathBuf,
        _search_path: SearchPathGuard,
        _temp_dir: TempDir,
    }

    impl StagedExifTool {
        pub(super) fn download() -> Result<Self> {
            let archive_name = format!("exiftool-{EXIFTOOL_VERSION}.zip");
            let url = format!("https://exiftool.org/{archive_name}");
            eprintln!("exiftool が見つからないため一時取得します: {url}");

            let temp_dir =
                tempfile::tempdir().context("一時ディレクトリを作成できませんでした")?;
            let archive = reqwest::blocking::get(&url)
                .and_then(reqwest::blocking::Response::error_for_status)
                .with_context(|| format!("ダウンロードに失敗しました: {url}"))?
                .bytes()
                .with_context(|| format!("ダウンロードを読み切れませんでした: {url}"))?;

            let executable = extract_executable(&archive, temp_dir.path())?;
            let search_path = SearchPathGuard::prepend(temp_dir.path())?;
            Ok(Self {
                executable,
                _search_path: search_path,
                _temp_dir: temp_dir,
            })
        }

        pub(super) fn executable(&self) -> &Path {
            &self.executable
        }
    }

    fn extract_executable(archive: &[u8], dir: &Path) -> Result<PathBuf> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive))
            .context("exiftool アーカイブを開けませんでした")?;
        let mut entry = zip
            .by_name(ARCHIVE_EXECUTABLE)
            .with_context(|| format!("アーカイブに {ARCHIVE_EXECUTABLE} がありません"))?;

        let executable = dir.join("exiftool.exe");
        let mut out = File::create(&executable).with_context(|| {
            format!("実行ファイルを書き出せませんでした: {}", executable.display())
        })?;
        std::io::copy(&mut entry, &mut out).context("アーカイブの展開に失敗しました")?;
        Ok(executable)
    }
}
