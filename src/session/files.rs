use log::debug;

use crate::{
    bus::Ch376Transport,
    error::Ch376Error,
    fat::DirInfo,
    protocol::{command::*, Status, DIR_INFO_SIZE, SECTOR_SIZE},
};

use super::{
    driver::{Cursor, Listing},
    Ch376Msc, Ch376Result, FileName,
};

impl<T: Ch376Transport> Ch376Msc<T> {
    /// `SET_FILE_NAME` with the NUL terminator. `/` alone selects the root.
    pub fn set_file_name(&mut self, name: &str) -> Ch376Result<(), T> {
        self.file_name = FileName::try_from(name).unwrap_or_default();
        self.stream_command(CMD10_SET_FILE_NAME, name.as_bytes(), &[0x00])
    }

    /// Like [`Self::set_file_name`]; an empty name resends the name of the
    /// open entry.
    pub fn send_file_name(&mut self, name: &str) -> Ch376Result<(), T> {
        self.ensure_attached()?;
        if name.is_empty() {
            let current = self.entry.short_name();
            self.set_file_name(&current)
        } else {
            self.set_file_name(name)
        }
    }

    /// Opens the entry named by the last `SET_FILE_NAME`.
    ///
    /// `USB_INT_SUCCESS` opened a file and loaded its entry, `ERR_OPEN_DIR`
    /// opened a directory, `ERR_MISS_FILE` reports absence. Anything else
    /// fails the session closed.
    pub fn open_file(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        self.file_open = false;
        self.file_written = false;
        self.cursor = Cursor::default();
        self.stream_len = 0;
        self.entry = DirInfo::EMPTY;

        let status = self.signal(CMD0H_FILE_OPEN, &[])?;
        self.answer = Some(status);
        match status {
            Status::USB_INT_SUCCESS => {
                self.load_entry()?;
                self.file_open = true;
            }
            Status::ERR_OPEN_DIR | Status::ERR_MISS_FILE => {}
            other => return Err(self.fail(Ch376Error::Status(other))),
        }
        Ok(status)
    }

    /// Closes the open file, updating its length when it was written, and
    /// returns to the root directory.
    pub fn close_file(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        let update_length = u8::from(self.file_written);
        let status = self.signal(CMD1H_FILE_CLOSE, &[update_length])?;
        self.change_directory("/", false)?;
        self.reset_file_container();
        self.answer = Some(status);
        Ok(status)
    }

    /// Creates (or truncates) and opens the file named by the last
    /// `SET_FILE_NAME`.
    pub fn create_file(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        let status = self.signal(CMD0H_FILE_CREATE, &[])?;
        self.answer = Some(status);
        if status.is_success() {
            self.cursor = Cursor::default();
            self.stream_len = 0;
            self.load_entry()?;
            self.file_open = true;
        }
        Ok(status)
    }

    pub fn delete_file(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        self.open_file()?;
        let status = self.signal(CMD0H_FILE_ERASE, &[])?;
        self.change_directory("/", false)?;
        self.answer = Some(status);
        Ok(status)
    }

    /// Erases the directory opened by the last path walk.
    pub fn delete_dir(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        let status = self.signal(CMD0H_FILE_ERASE, &[])?;
        self.change_directory("/", false)?;
        self.answer = Some(status);
        Ok(status)
    }

    /// `BYTE_LOCATE`; positions past the end clamp to the file size.
    /// [`crate::protocol::CURSOR_END`] seeks to the end for appending.
    pub fn move_cursor(&mut self, position: u32) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        let clamped = position.min(self.entry.size);
        self.cursor.sector_offset = (clamped % SECTOR_SIZE as u32) as u16;
        let status = self.signal(CMD4H_BYTE_LOCATE, &position.to_le_bytes())?;
        self.answer = Some(status);
        self.cursor.position = clamped;
        Ok(status)
    }

    /// Writes the (possibly edited) entry back to the directory.
    pub fn save_file_attributes(&mut self) -> Ch376Result<Status, T> {
        self.ensure_attached()?;
        self.file_written = true;
        let status = self.signal(CMD1H_DIR_INFO_READ, &[DIR_INFO_CURRENT])?;
        self.expect(status, &[Status::USB_INT_SUCCESS])?;
        let raw = self.entry.to_bytes();
        self.stream_command(CMD20_WR_OFS_DATA, &[0x00, DIR_INFO_SIZE as u8], &raw)?;
        let status = self.signal(CMD0H_DIR_INFO_SAVE, &[])?;
        self.answer = Some(status);
        Ok(status)
    }

    /// Returns the next entry of the current directory matching `pattern`
    /// (`*` when empty), or `None` once the listing is exhausted. The
    /// following call starts over.
    pub fn list_dir(&mut self, pattern: &str) -> Ch376Result<Option<DirInfo>, T> {
        self.ensure_attached()?;
        let status = match self.listing {
            Listing::Idle => {
                let pattern = if pattern.is_empty() { "*" } else { pattern };
                self.set_file_name(pattern)?;
                self.signal(CMD0H_FILE_OPEN, &[])?
            }
            Listing::Pending(status) => status,
        };
        self.answer = Some(status);

        match status {
            Status::ERR_MISS_FILE => {
                self.listing = Listing::Idle;
                Ok(None)
            }
            Status::USB_INT_DISK_READ => {
                let mut raw = [0u8; DIR_INFO_SIZE];
                let len = self.read_payload(&mut raw)?;
                self.entry = DirInfo::from_bytes(&raw[..len]);
                let next = self.signal(CMD0H_FILE_ENUM_GO, &[])?;
                self.listing = Listing::Pending(next);
                Ok(Some(self.entry))
            }
            other => Err(self.fail(Ch376Error::Status(other))),
        }
    }

    pub fn reset_file_list(&mut self) {
        self.listing = Listing::Idle;
    }

    /// `DIR_INFO_READ` of the open entry followed by its 32-byte record.
    fn load_entry(&mut self) -> Ch376Result<(), T> {
        let status = self.signal(CMD1H_DIR_INFO_READ, &[DIR_INFO_CURRENT])?;
        self.expect(status, &[Status::USB_INT_SUCCESS])?;
        let mut raw = [0u8; DIR_INFO_SIZE];
        let len = self.read_payload(&mut raw)?;
        self.entry = DirInfo::from_bytes(&raw[..len]);
        debug!(
            "ch376: opened {} ({} bytes)",
            self.entry.short_name(),
            self.entry.size
        );
        Ok(())
    }
}
