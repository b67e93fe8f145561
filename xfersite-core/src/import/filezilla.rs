//! FileZilla site manager importer.
//!
//! Parses `sitemanager.xml` of FileZilla 3. `Folder` elements carry their
//! name as text and nest `Server` elements; the folder chain becomes the
//! site's path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{ImportError, ImportOutcome};
use crate::models::{
    AutoSwitch, FsProtocol, Ftps, SessionData, ANONYMOUS_PASSWORD, ANONYMOUS_USER_NAME,
};

use super::traits::{ImportResult, ImportSource};

const SECS_PER_DAY: f64 = 86_400.0;

/// Folder seen while parsing
#[derive(Debug, Default)]
struct FolderData {
    name: String,
    parent: Option<usize>,
}

/// Server element with its child element texts
#[derive(Debug, Default)]
struct ServerData {
    folder: Option<usize>,
    fields: HashMap<String, String>,
    base64_password: bool,
}

impl ServerData {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn int(&self, name: &str, default: i64) -> i64 {
        self.text(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }
}

/// Importer for FileZilla site manager files
pub struct FileZillaImporter {
    custom_paths: Vec<PathBuf>,
    defaults: SessionData,
}

impl FileZillaImporter {
    /// Creates an importer looking at the default FileZilla configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom_paths: Vec::new(),
            defaults: SessionData::new(""),
        }
    }

    /// Creates an importer reading custom files
    #[must_use]
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            custom_paths: paths,
            ..Self::new()
        }
    }

    /// Seeds imported sites from `defaults` instead of factory defaults
    #[must_use]
    pub fn with_defaults(mut self, defaults: SessionData) -> Self {
        self.defaults = defaults;
        self
    }

    /// Parses site manager XML
    #[must_use]
    pub fn parse_xml(&self, content: &str, source_path: &str) -> ImportResult {
        let mut result = ImportResult::new();
        let content = content.trim_start_matches('\u{feff}');

        let mut reader = Reader::from_str(content);

        let mut folders: Vec<FolderData> = Vec::new();
        let mut servers: Vec<ServerData> = Vec::new();
        let mut folder_stack: Vec<usize> = Vec::new();
        let mut current_server: Option<ServerData> = None;
        let mut current_field: Option<String> = None;
        let mut in_servers = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    match name.as_str() {
                        "Servers" => in_servers = true,
                        "Folder" if in_servers && current_server.is_none() => {
                            folders.push(FolderData {
                                name: String::new(),
                                parent: folder_stack.last().copied(),
                            });
                            folder_stack.push(folders.len() - 1);
                        }
                        "Server" if in_servers && current_server.is_none() => {
                            current_server = Some(ServerData {
                                folder: folder_stack.last().copied(),
                                ..ServerData::default()
                            });
                        }
                        _ => {
                            if let Some(server) = current_server.as_mut() {
                                if name == "Pass" && is_base64_encoded(&e) {
                                    server.base64_password = true;
                                }
                                current_field = Some(name);
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    match name.as_str() {
                        "Servers" => in_servers = false,
                        "Server" if current_field.is_none() => {
                            if let Some(server) = current_server.take() {
                                servers.push(server);
                            }
                        }
                        "Folder" if current_server.is_none() => {
                            folder_stack.pop();
                        }
                        _ => current_field = None,
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    append_text(
                        &mut current_server,
                        current_field.as_deref(),
                        &folder_stack,
                        &mut folders,
                        &text,
                    );
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity: &[u8] = &e;
                    let text = match entity {
                        b"amp" => "&",
                        b"lt" => "<",
                        b"gt" => ">",
                        b"quot" => "\"",
                        b"apos" => "'",
                        _ => continue,
                    };
                    append_text(
                        &mut current_server,
                        current_field.as_deref(),
                        &folder_stack,
                        &mut folders,
                        text,
                    );
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    result.add_error(ImportError::ParseError {
                        source_name: "FileZilla".to_string(),
                        reason: format!("XML parse error: {e}"),
                    });
                    return result;
                }
                _ => {}
            }
        }

        for server in &servers {
            let path = folder_path(&folders, server.folder);
            let data = self.convert_server(server, &path);
            if data.can_login() {
                debug!(site = %data.name(), "Imported FileZilla site");
                result.add_session(data);
            } else {
                result.skip(data.name(), "Missing host", source_path);
            }
        }

        result
    }

    fn convert_server(&self, server: &ServerData, path: &str) -> SessionData {
        let mut data = self.defaults.clone();
        let name = SessionData::make_valid_name(server.text("Name").unwrap_or_default());
        data.set_name(SessionData::compose_path(path, &name));
        if let Some(host) = server.text("Host") {
            data.set_host_name(host);
        }
        let port = server.int("Port", i64::from(data.port_number()));
        if let Ok(port) = u16::try_from(port) {
            data.set_port_number(port);
        }

        match server.int("Protocol", 0) {
            1 => data.set_fs_protocol(FsProtocol::Sftp),
            3 => {
                data.set_fs_protocol(FsProtocol::Ftp);
                data.set_ftps(Ftps::Implicit);
            }
            4 => {
                data.set_fs_protocol(FsProtocol::Ftp);
                data.set_ftps(Ftps::ExplicitTls);
            }
            _ => data.set_fs_protocol(FsProtocol::Ftp),
        }

        if server.int("Logontype", 0) == 0 {
            data.set_user_name(ANONYMOUS_USER_NAME);
            data.set_password(ANONYMOUS_PASSWORD);
        } else {
            if let Some(user) = server.text("User") {
                data.set_user_name(user);
            }
            if let Some(account) = server.text("Account") {
                data.set_ftp_account(account);
            }
            if let Some(password) = server.fields.get("Pass") {
                let password = password.trim();
                if server.base64_password {
                    match base64::engine::general_purpose::STANDARD.decode(password) {
                        Ok(bytes) => data.set_password(&String::from_utf8_lossy(&bytes)),
                        Err(e) => debug!(site = %data.name(), error = %e, "Undecodable password"),
                    }
                } else {
                    data.set_password(password);
                }
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let default_offset = (data.time_difference() * SECS_PER_DAY).round() as i64;
        #[allow(clippy::cast_precision_loss)]
        let offset = server.int("TimezoneOffset", default_offset) as f64 / SECS_PER_DAY;
        data.set_time_difference(offset);
        data.set_time_difference_auto(offset.abs() < f64::EPSILON);

        match server.text("PasvMode") {
            Some(mode) if mode.eq_ignore_ascii_case("MODE_PASSIVE") => data.set_ftp_pasv_mode(true),
            Some(mode) if mode.eq_ignore_ascii_case("MODE_ACTIVE") => data.set_ftp_pasv_mode(false),
            _ => {}
        }
        match server.text("EncodingType") {
            Some(encoding) if encoding.eq_ignore_ascii_case("Auto") => data.set_not_utf(AutoSwitch::Auto),
            Some(encoding) if encoding.eq_ignore_ascii_case("UTF-8") => data.set_not_utf(AutoSwitch::Off),
            _ => {}
        }

        if let Some(note) = server.text("Comments") {
            data.set_note(note);
        }
        if let Some(local) = server.text("LocalDir") {
            data.set_local_directory(local);
        }
        if let Some(remote) = server.text("RemoteDir") {
            data.set_remote_directory(decode_remote_dir(remote));
        }
        let sync = server.int("SyncBrowsing", i64::from(data.synchronize_browsing()));
        data.set_synchronize_browsing(sync != 0);

        data
    }
}

impl Default for FileZillaImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSource for FileZillaImporter {
    fn source_id(&self) -> &'static str {
        "filezilla"
    }

    fn display_name(&self) -> &'static str {
        "FileZilla"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        if !self.custom_paths.is_empty() {
            return self.custom_paths.clone();
        }
        dirs::config_dir()
            .map(|config| vec![config.join("filezilla").join("sitemanager.xml")])
            .unwrap_or_default()
    }

    fn import_from_path(&self, path: &Path) -> ImportOutcome<ImportResult> {
        if !path.is_file() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(self.parse_xml(&content, &path.display().to_string()))
    }
}

fn is_base64_encoded(element: &BytesStart<'_>) -> bool {
    element.attributes().flatten().any(|attr| {
        attr.key.as_ref() == b"encoding" && attr.value.as_ref().eq_ignore_ascii_case(b"base64")
    })
}

fn append_text(
    server: &mut Option<ServerData>,
    field: Option<&str>,
    folder_stack: &[usize],
    folders: &mut [FolderData],
    text: &str,
) {
    match (server.as_mut(), field) {
        (Some(server), Some(field)) => {
            server.fields.entry(field.to_string()).or_default().push_str(text);
        }
        (Some(_), None) => {}
        (None, _) => {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            if let Some(folder) = folder_stack.last().and_then(|&index| folders.get_mut(index)) {
                if !folder.name.is_empty() {
                    folder.name.push(' ');
                }
                folder.name.push_str(text);
            }
        }
    }
}

/// Joins the folder chain ending at `folder` into a site path
fn folder_path(folders: &[FolderData], mut folder: Option<usize>) -> String {
    let mut segments = Vec::new();
    while let Some(index) = folder {
        let Some(data) = folders.get(index) else {
            break;
        };
        segments.push(SessionData::make_valid_name(data.name.trim()).trim().to_string());
        folder = data.parent;
    }
    segments
        .iter()
        .rev()
        .fold(String::new(), |path, segment| SessionData::compose_path(&path, segment))
}

/// Splits off the next space separated token
fn cut_token(text: &str) -> (&str, &str) {
    text.split_once(' ').unwrap_or((text, ""))
}

/// Decodes FileZilla's `type prefix_len len segment len segment ...` path
/// encoding into a Unix path
fn decode_remote_dir(encoded: &str) -> String {
    let (_kind, rest) = cut_token(encoded.trim());
    let (prefix_len, mut rest) = cut_token(rest);
    let prefix_len: usize = prefix_len.parse().unwrap_or(0);
    if prefix_len > 0 {
        rest = rest.get(prefix_len..).unwrap_or("").trim_start();
    }

    let mut path = String::from("/");
    while !rest.is_empty() {
        let (len, tail) = cut_token(rest);
        let len: usize = len.parse().unwrap_or(0);
        let end = tail
            .char_indices()
            .nth(len)
            .map_or(tail.len(), |(index, _)| index);
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&tail[..end]);
        rest = tail.get(end + 1..).unwrap_or("");
    }
    path
}
