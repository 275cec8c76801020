use url::Url;

/// 附件的真实类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// CSV / TSV 等文本表格
    Tabular,
    /// xlsx / xls / ods 工作簿
    Workbook,
    Pdf,
    Audio,
}

/// 支持的扩展名
const EXTENSIONS: &[(&str, FileKind)] = &[
    ("csv", FileKind::Tabular),
    ("tsv", FileKind::Tabular),
    ("txt", FileKind::Tabular),
    ("xlsx", FileKind::Workbook),
    ("xls", FileKind::Workbook),
    ("ods", FileKind::Workbook),
    ("pdf", FileKind::Pdf),
    ("mp3", FileKind::Audio),
    ("wav", FileKind::Audio),
    ("ogg", FileKind::Audio),
    ("opus", FileKind::Audio),
    ("m4a", FileKind::Audio),
    ("flac", FileKind::Audio),
    ("aac", FileKind::Audio),
];

/// 嗅探时检查的前缀长度
const SNIFF_WINDOW: usize = 4096;

impl FileKind {
    /// 按链接扩展名猜测类型
    pub fn from_extension(url: &str) -> Option<FileKind> {
        let ext = extension_of(url)?;
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, kind)| *kind)
    }

    /// 按字节签名判断真实类型
    ///
    /// 服务器可能给错扩展名，二进制格式只认签名；无签名的纯文本一律按表格处理
    pub fn sniff(bytes: &[u8]) -> Option<FileKind> {
        let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];

        if head.windows(5).take(1024).any(|w| w == b"%PDF-") {
            return Some(FileKind::Pdf);
        }
        if head.starts_with(b"PK\x03\x04")
            || head.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(FileKind::Workbook);
        }
        if is_audio(head) {
            return Some(FileKind::Audio);
        }
        if !head.is_empty() && is_text(head) {
            return Some(FileKind::Tabular);
        }
        None
    }
}

fn is_audio(head: &[u8]) -> bool {
    head.starts_with(b"ID3")
        || head.starts_with(b"OggS")
        || head.starts_with(b"fLaC")
        || (head.starts_with(b"RIFF") && head.get(8..12) == Some(&b"WAVE"[..]))
        || head.get(4..8) == Some(&b"ftyp"[..])
        // MPEG / ADTS 帧同步
        || (head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0)
}

fn is_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // 截断在多字节字符中间不算错误
        Err(e) => e.error_len().is_none(),
    }
}

/// 提取链接路径的小写扩展名
pub fn extension_of(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// 下载到的附件
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: String,
    pub bytes: Vec<u8>,
    /// 嗅探得到的类型，无法识别时为 None
    pub kind: Option<FileKind>,
}

impl FetchedResource {
    pub fn new(url: impl Into<String>, bytes: Vec<u8>) -> Self {
        let kind = FileKind::sniff(&bytes);
        Self {
            url: url.into(),
            bytes,
            kind,
        }
    }
}
