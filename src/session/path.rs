use log::debug;

use crate::{
    bus::Ch376Transport,
    error::Ch376Error,
    protocol::{command::*, Status, SEGMENT_NAME_MAX},
};

use super::{Ch376Msc, Ch376Result};

impl<T: Ch376Transport> Ch376Msc<T> {
    /// Opens `path` from the root, one `/`-separated segment at a time.
    ///
    /// With `create_missing` absent directories are created on the way. A
    /// path-level failure (too long, a file in the way, a refused create)
    /// returns to the root with depth 0 and keeps the medium attached.
    /// Returns the status of the last segment, `ERR_OPEN_DIR` for a walk
    /// that ended on an existing directory.
    pub fn change_directory(&mut self, path: &str, create_missing: bool) -> Ch376Result<Status, T> {
        self.dir_depth = 0;
        self.ensure_attached()?;
        if path.len() >= self.config.path_len_limit() {
            return Err(self.reject(Ch376Error::LongFilename));
        }
        debug!("ch376: cd {} (create: {})", path, create_missing);

        self.set_file_name("/")?;
        let mut status = self.open_file()?;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            match self.enter_segment(segment, create_missing) {
                Ok(entered) => {
                    status = entered;
                    self.dir_depth += 1;
                }
                Err(err) => return Err(self.unwind_to_root(err)),
            }
        }
        Ok(status)
    }

    fn enter_segment(&mut self, segment: &str, create_missing: bool) -> Ch376Result<Status, T> {
        if segment.len() > SEGMENT_NAME_MAX {
            return Err(Ch376Error::LongFilename);
        }
        self.set_file_name(segment)?;
        match self.open_file()? {
            Status::ERR_OPEN_DIR => Ok(Status::ERR_OPEN_DIR),
            Status::USB_INT_SUCCESS => {
                self.signal(CMD1H_FILE_CLOSE, &[0x00])?;
                Err(Ch376Error::Status(Status::ERR_FOUND_NAME))
            }
            Status::ERR_MISS_FILE if create_missing => {
                let created = self.signal(CMD0H_DIR_CREATE, &[])?;
                self.answer = Some(created);
                if created.is_success() {
                    Ok(created)
                } else {
                    Err(Ch376Error::Status(created))
                }
            }
            other => Err(Ch376Error::Status(other)),
        }
    }

    fn unwind_to_root(&mut self, err: Ch376Error<T::Error>) -> Ch376Error<T::Error> {
        if !self.attached {
            return err;
        }
        let err = self.reject(err);
        self.dir_depth = 0;
        if self.set_file_name("/").is_ok() {
            let _ = self.open_file();
        }
        err
    }
}
