//! Software CH376: decodes command frames, keeps a tiny FAT tree in memory
//! and answers through a simulated interrupt line.
#![allow(dead_code)]

use std::collections::BTreeMap;

use ch376msc::{protocol::command::*, Ch376Config, Ch376Msc, Ch376Transport, Status};

pub const PACKET: usize = 64;
const SECTOR: usize = 512;
const IC_VERSION: u8 = 0x43;

#[derive(Clone, Debug)]
pub struct Node {
    pub dir: bool,
    pub data: Vec<u8>,
    pub record: [u8; 32],
}

pub struct SimChip {
    frame: Vec<u8>,
    pub opcodes: Vec<u8>,
    pub now_us: u64,
    /// The interrupt line never asserts while set.
    pub hang: bool,
    /// Mount commands that stay unanswered before one succeeds.
    pub silent_mounts: u32,
    pub device_present: bool,
    /// `CHECK_EXIST` is not echoed, as with a missing or unpowered chip.
    pub controller_absent: bool,
    pub total_sectors: u32,
    pub free_sectors: u32,
    pub mode: u8,
    interrupt: Option<u8>,
    nodes: BTreeMap<String, Node>,
    cwd: String,
    name: String,
    open: Option<String>,
    pos: usize,
    out: Vec<u8>,
    write_left: usize,
    write_grant: usize,
    listing: Vec<String>,
    listing_idx: usize,
    ofs_buf: [u8; 32],
}

impl SimChip {
    pub fn new() -> Self {
        Self {
            frame: Vec::new(),
            opcodes: Vec::new(),
            now_us: 0,
            hang: false,
            silent_mounts: 0,
            device_present: true,
            controller_absent: false,
            total_sectors: 7_800_000,
            free_sectors: 7_000_000,
            mode: 0,
            interrupt: None,
            nodes: BTreeMap::new(),
            cwd: "/".into(),
            name: String::new(),
            open: None,
            pos: 0,
            out: Vec::new(),
            write_left: 0,
            write_grant: 0,
            listing: Vec::new(),
            listing_idx: 0,
            ofs_buf: [0; 32],
        }
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, true, Vec::new());
        self
    }

    pub fn with_file(mut self, path: &str, data: &[u8]) -> Self {
        self.insert(path, false, data.to_vec());
        self
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.get(&path.to_ascii_uppercase())
    }

    pub fn elapsed_ms(&self) -> u32 {
        (self.now_us / 1000) as u32
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn count(&self, opcode: u8) -> usize {
        self.opcodes.iter().filter(|&&op| op == opcode).count()
    }

    /// Device removal as seen by the chip: a pending disconnect interrupt.
    pub fn unplug(&mut self) {
        self.device_present = false;
        self.interrupt = Some(Status::USB_INT_DISCONNECT.raw());
    }

    pub fn plug(&mut self) {
        self.device_present = true;
        self.interrupt = Some(Status::USB_INT_CONNECT.raw());
    }

    fn insert(&mut self, path: &str, dir: bool, data: Vec<u8>) {
        let path = path.to_ascii_uppercase();
        let name = path.rsplit('/').next().unwrap_or("");
        let mut record = [0u8; 32];
        record[..11].copy_from_slice(&short_name(name));
        record[11] = if dir { 0x10 } else { 0x20 };
        // 2021-03-14 12:30:00
        record[22..24].copy_from_slice(&((12u16 << 11) | (30 << 5)).to_le_bytes());
        record[24..26].copy_from_slice(&(((2021u16 - 1980) << 9) | (3 << 5) | 14).to_le_bytes());
        record[28..32].copy_from_slice(&(data.len() as u32).to_le_bytes());
        self.nodes.insert(path, Node { dir, data, record });
    }

    fn resolve(&self, name: &str) -> String {
        let name = name.to_ascii_uppercase();
        if name.starts_with('/') {
            name
        } else if self.cwd == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.cwd)
        }
    }

    fn raise(&mut self, status: Status) {
        self.interrupt = Some(status.raw());
    }

    fn output(&mut self, index: usize) -> u8 {
        let opcode = self.frame[0];
        match opcode {
            CMD01_GET_IC_VER => IC_VERSION,
            CMD11_CHECK_EXIST if index == 2 && !self.controller_absent => !self.frame[1],
            CMD11_SET_USB_MODE if index == 2 => {
                self.mode = self.frame[1];
                if self.mode == 0x06 && self.device_present {
                    self.raise(Status::USB_INT_CONNECT);
                }
                Status::CMD_RET_SUCCESS.raw()
            }
            CMD01_GET_STATUS => self.interrupt.take().unwrap_or(0),
            CMD01_RD_USB_DATA0 if index == 1 => self.out.len() as u8,
            CMD01_RD_USB_DATA0 => self.out.get(index - 2).copied().unwrap_or(0),
            CMD01_WR_REQ_DATA if index == 1 => self.write_grant as u8,
            _ => 0,
        }
    }

    fn end_frame(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        let Some((&opcode, args)) = frame.split_first() else {
            return;
        };
        match opcode {
            CMD00_RESET_ALL => {
                self.interrupt = None;
                self.open = None;
                self.cwd = "/".into();
            }
            CMD10_SET_FILE_NAME => {
                let end = args.iter().position(|&b| b == 0).unwrap_or(args.len());
                self.name = String::from_utf8_lossy(&args[..end]).into_owned();
            }
            CMD20_WR_OFS_DATA => {
                let offset = args[0] as usize;
                for (idx, &byte) in args[2..].iter().enumerate() {
                    if let Some(slot) = self.ofs_buf.get_mut(offset + idx) {
                        *slot = byte;
                    }
                }
            }
            CMD01_RD_USB_DATA0 => self.out.clear(),
            CMD01_WR_REQ_DATA => self.commit_write(&args[1..]),
            _ => {
                if let Some(status) = self.execute(opcode, args) {
                    self.raise(status);
                }
            }
        }
    }

    fn commit_write(&mut self, data: &[u8]) {
        let Some(path) = self.open.clone() else {
            return;
        };
        let pos = self.pos;
        if let Some(node) = self.nodes.get_mut(&path) {
            let end = pos + data.len();
            if node.data.len() < end {
                node.data.resize(end, 0);
            }
            node.data[pos..end].copy_from_slice(data);
            let size = node.data.len() as u32;
            node.record[28..32].copy_from_slice(&size.to_le_bytes());
        }
        self.pos += data.len();
        self.write_left -= data.len();
        self.write_grant = 0;
    }

    fn grant_write(&mut self) -> Status {
        if self.write_left == 0 {
            return Status::USB_INT_SUCCESS;
        }
        self.write_grant = self.write_left.min(PACKET).min(SECTOR - self.pos % SECTOR);
        Status::USB_INT_DISK_WRITE
    }

    fn list_next(&mut self) -> Status {
        match self.listing.get(self.listing_idx) {
            Some(path) => {
                self.out = self.nodes[path].record.to_vec();
                self.listing_idx += 1;
                Status::USB_INT_DISK_READ
            }
            None => Status::ERR_MISS_FILE,
        }
    }

    fn execute(&mut self, opcode: u8, args: &[u8]) -> Option<Status> {
        let status = match opcode {
            CMD0H_DISK_MOUNT => {
                if self.silent_mounts > 0 {
                    self.silent_mounts -= 1;
                    return None;
                }
                if self.device_present {
                    Status::USB_INT_SUCCESS
                } else {
                    Status::ERR_DISK_DISCON
                }
            }
            CMD0H_DISK_QUERY => {
                self.out.clear();
                self.out.extend_from_slice(&self.total_sectors.to_le_bytes());
                self.out.extend_from_slice(&self.free_sectors.to_le_bytes());
                self.out.push(0x03);
                Status::USB_INT_SUCCESS
            }
            CMD0H_FILE_OPEN => self.open_name(),
            CMD0H_FILE_ENUM_GO => self.list_next(),
            CMD0H_FILE_CREATE => {
                let path = self.resolve(&self.name.clone());
                self.insert(&path, false, Vec::new());
                self.open = Some(path);
                self.pos = 0;
                Status::USB_INT_SUCCESS
            }
            CMD0H_DIR_CREATE => {
                let path = self.resolve(&self.name.clone());
                match self.nodes.get(&path) {
                    Some(node) if !node.dir => Status::ERR_FOUND_NAME,
                    _ => {
                        self.insert(&path, true, Vec::new());
                        self.cwd = path;
                        Status::USB_INT_SUCCESS
                    }
                }
            }
            CMD0H_FILE_ERASE => {
                if let Some(path) = self.open.take() {
                    self.nodes.remove(&path);
                    Status::USB_INT_SUCCESS
                } else if self.cwd != "/" {
                    let prefix = format!("{}/", self.cwd);
                    self.nodes
                        .retain(|path, _| !path.starts_with(&prefix));
                    let cwd = std::mem::replace(&mut self.cwd, "/".into());
                    self.nodes.remove(&cwd);
                    Status::USB_INT_SUCCESS
                } else {
                    Status::ERR_MISS_FILE
                }
            }
            CMD1H_FILE_CLOSE => {
                if self.open.take().is_some() {
                    Status::USB_INT_SUCCESS
                } else {
                    Status::ERR_FILE_CLOSE
                }
            }
            CMD1H_DIR_INFO_READ => match &self.open {
                Some(path) => {
                    self.out = self.nodes[path].record.to_vec();
                    Status::USB_INT_SUCCESS
                }
                None => Status::ERR_MISS_FILE,
            },
            CMD0H_DIR_INFO_SAVE => match self.open.clone() {
                Some(path) => {
                    if let Some(node) = self.nodes.get_mut(&path) {
                        node.record = self.ofs_buf;
                    }
                    Status::USB_INT_SUCCESS
                }
                None => Status::ERR_FILE_CLOSE,
            },
            CMD4H_BYTE_LOCATE => {
                let target = u32::from_le_bytes([args[0], args[1], args[2], args[3]]) as usize;
                self.pos = target.min(self.open_len());
                Status::USB_INT_SUCCESS
            }
            CMD2H_BYTE_READ => {
                let Some(path) = self.open.clone() else {
                    return Some(Status::ERR_FILE_CLOSE);
                };
                let wanted = u16::from_le_bytes([args[0], args[1]]) as usize;
                let data = &self.nodes[&path].data;
                let grant = wanted.min(data.len().saturating_sub(self.pos)).min(PACKET);
                if grant == 0 {
                    Status::USB_INT_SUCCESS
                } else {
                    self.out = data[self.pos..self.pos + grant].to_vec();
                    self.pos += grant;
                    Status::USB_INT_DISK_READ
                }
            }
            CMD0H_BYTE_RD_GO => Status::USB_INT_SUCCESS,
            CMD2H_BYTE_WRITE => {
                if self.open.is_none() {
                    return Some(Status::ERR_FILE_CLOSE);
                }
                self.write_left = u16::from_le_bytes([args[0], args[1]]) as usize;
                self.grant_write()
            }
            CMD0H_BYTE_WR_GO => self.grant_write(),
            _ => return None,
        };
        Some(status)
    }

    fn open_len(&self) -> usize {
        self.open
            .as_ref()
            .and_then(|path| self.nodes.get(path))
            .map_or(0, |node| node.data.len())
    }

    fn open_name(&mut self) -> Status {
        self.open = None;
        let name = self.name.to_ascii_uppercase();
        if name == "/" {
            self.cwd = "/".into();
            return Status::ERR_OPEN_DIR;
        }
        if let Some(prefix) = name.strip_suffix('*') {
            let parent = if self.cwd == "/" {
                "/".to_string()
            } else {
                format!("{}/", self.cwd)
            };
            self.listing = self
                .nodes
                .keys()
                .filter(|path| {
                    path.strip_prefix(&parent)
                        .is_some_and(|rest| !rest.contains('/') && rest.starts_with(prefix))
                })
                .cloned()
                .collect();
            self.listing_idx = 0;
            return self.list_next();
        }
        let path = self.resolve(&name);
        match self.nodes.get(&path) {
            Some(node) if node.dir => {
                self.cwd = path;
                Status::ERR_OPEN_DIR
            }
            Some(_) => {
                self.open = Some(path);
                self.pos = 0;
                Status::USB_INT_SUCCESS
            }
            None => Status::ERR_MISS_FILE,
        }
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

impl Ch376Transport for SimChip {
    type Error = ();

    fn select(&mut self, active: bool) -> Result<(), ()> {
        if active {
            self.frame.clear();
        } else {
            self.end_frame();
        }
        Ok(())
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, ()> {
        self.frame.push(byte);
        let index = self.frame.len() - 1;
        if index == 0 {
            self.opcodes.push(byte);
            return Ok(0xFF);
        }
        Ok(self.output(index))
    }

    fn interrupt_asserted(&mut self) -> Result<bool, ()> {
        self.now_us += 1000;
        Ok(!self.hang && self.interrupt.is_some())
    }

    fn now_ms(&mut self) -> u32 {
        (self.now_us / 1000) as u32
    }

    fn delay_us(&mut self, us: u32) {
        self.now_us += us as u64;
    }
}

fn short_name(name: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    let (base, ext) = name.split_once('.').unwrap_or((name, ""));
    for (slot, byte) in out[..8].iter_mut().zip(base.bytes()) {
        *slot = byte;
    }
    for (slot, byte) in out[8..].iter_mut().zip(ext.bytes()) {
        *slot = byte;
    }
    out
}

/// Session over `chip`, initialised and attached.
pub fn attached(chip: SimChip) -> Ch376Msc<SimChip> {
    let mut session = Ch376Msc::new(chip, Ch376Config::default());
    session.init().expect("controller init");
    session.attach().expect("attach");
    session
}
