//! Folders and workspaces
//!
//! A folder is a name prefix shared by several sites (`folder/site`). A
//! workspace is a folder of workspace entries, each either a full copy of a
//! site or a link to a stored site plus the directory and color state the
//! workspace was saved with.

use std::collections::HashSet;

use crate::error::StorageResult;
use crate::models::SessionData;

use super::StoredSessionList;

impl StoredSessionList {
    fn is_folder_or_workspace(&self, name: &str, workspace: bool) -> bool {
        if name.is_empty() {
            return false;
        }
        self.iter()
            .find(|data| data.is_in_folder_or_workspace(name))
            .is_some_and(|first| first.is_workspace() == workspace)
    }

    /// Returns true if `name` is a folder of sites
    pub fn is_folder(&self, name: &str) -> bool {
        self.is_folder_or_workspace(name, false)
    }

    /// Returns true if `name` is a workspace
    pub fn is_workspace(&self, name: &str) -> bool {
        self.is_folder_or_workspace(name, true)
    }

    /// Returns true if any workspace is stored
    pub fn has_any_workspace(&self) -> bool {
        self.iter().any(SessionData::is_workspace)
    }

    /// Names of all workspaces, sorted and without duplicates
    pub fn workspaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .iter()
            .filter(|data| data.is_workspace())
            .map(SessionData::folder_name)
            .collect();
        names.sort_by_key(|name| name.to_lowercase());
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        names
    }

    /// Follows workspace links to the stored site they refer to.
    ///
    /// Returns `data` itself when it has no link and `None` when a link is
    /// dangling or the links form a cycle.
    pub fn resolve_workspace_data<'a>(&'a self, data: &'a SessionData) -> Option<&'a SessionData> {
        let mut visited = HashSet::new();
        let mut current = data;
        while !current.link().is_empty() {
            if !visited.insert(current.name().to_lowercase()) {
                tracing::warn!(site = %data.name(), link = %current.link(), "Workspace links form a cycle");
                return None;
            }
            current = self.find_by_name(current.link())?;
        }
        Some(current)
    }

    /// Returns true if `data`, after resolving links, can connect
    pub fn can_login(&self, data: &SessionData) -> bool {
        self.resolve_workspace_data(data)
            .is_some_and(SessionData::can_login)
    }

    fn resolve_in_folder<'a>(&'a self, data: &'a SessionData, name: &str) -> Option<&'a SessionData> {
        if !data.is_in_folder_or_workspace(name) {
            return None;
        }
        self.resolve_workspace_data(data)
            .filter(|resolved| resolved.can_login() && resolved.link().is_empty())
    }

    /// Sites of a folder or workspace, ready to connect.
    ///
    /// Links are resolved; a linking entry that carries its own directory
    /// or color state passes it on to the copy of the linked site.
    pub fn get_folder_or_workspace(&self, name: &str) -> Vec<SessionData> {
        self.iter()
            .filter_map(|raw| {
                let data = self.resolve_in_folder(raw, name)?;
                let mut site = data.clone();
                if !raw.link().is_empty() && raw.has_state_data() {
                    site.copy_state_data(raw);
                }
                Some(site)
            })
            .collect()
    }

    /// Display names of the sites of a folder or workspace
    pub fn get_folder_or_workspace_list(&self, name: &str) -> Vec<String> {
        self.iter()
            .filter_map(|raw| self.resolve_in_folder(raw, name))
            .map(SessionData::session_name)
            .collect()
    }

    /// Replaces the workspace `name` with entries for `sessions`.
    ///
    /// Existing entries are deleted from the profile store right away; the
    /// new entries are marked modified and written by the next save.
    ///
    /// # Errors
    ///
    /// Returns an error if deleting an old entry fails.
    pub fn new_workspace(&mut self, name: &str, sessions: &[SessionData]) -> StorageResult<()> {
        let mut index = 0;
        while index < self.sessions.len() {
            if self.sessions[index].is_in_folder_or_workspace(name) {
                self.sessions[index].remove(self.factory.as_ref())?;
                self.sessions.remove(index);
            } else {
                index += 1;
            }
        }

        for data in sessions {
            let mut entry = data.clone();
            entry.set_name(SessionData::compose_path(name, data.name()));
            entry.set_modified(true);
            self.insert_sorted(entry);
        }
        tracing::info!(workspace = %name, count = sessions.len(), "Created workspace");
        Ok(())
    }

    /// Workspace entry for `data`.
    ///
    /// When `data` is a stored site, the entry only links to it and keeps
    /// its directory and color state; otherwise it is a full copy.
    pub fn save_workspace_data(&self, data: &SessionData) -> SessionData {
        let mut entry = self.new_session_data("");
        if self.find_same(data).is_some() {
            entry.copy_state_data(data);
            entry.set_link(data.name());
        } else {
            entry.assign(data);
        }
        entry.set_is_workspace(true);
        entry
    }
}
