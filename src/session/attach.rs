use log::{debug, warn};

use crate::{
    bus::{Ch376Transport, EngineFault},
    config::{
        DriveSource, CONTROLLER_RESET_SETTLE_MS, INT_DRAIN_INTERVAL_MS, MODE_SWITCH_SETTLE_US,
    },
    error::Ch376Error,
    fat::{DriveInfo, DRIVE_INFO_SIZE},
    protocol::{command::*, Status, UsbMode, UsbSpeed},
};

use super::{Ch376Msc, Ch376Result};

impl<T: Ch376Transport> Ch376Msc<T> {
    /// Resets the controller, checks that it answers and selects the
    /// working mode of the configured source. With
    /// [`crate::Ch376Config::interrupt_on_sdo`] the interrupt is moved onto SDO
    /// right after the reset.
    pub fn init(&mut self) -> Ch376Result<(), T> {
        self.command(CMD00_RESET_ALL, &[])?;
        self.engine.delay_ms(CONTROLLER_RESET_SETTLE_MS);
        if self.config.interrupt_on_sdo {
            self.route_interrupt_to_sdo()?;
        }

        self.controller_ready = self.ping(CHECK_EXIST_PROBE)?;
        if !self.controller_ready {
            return Err(self.fail(Ch376Error::ControllerNotFound));
        }
        let version = self.ic_version()?;
        debug!("ch376: controller ready, ic version 0x{:02X}", version);

        self.enter_source_mode()
    }

    /// `CHECK_EXIST`: the chip answers with the bitwise inverse.
    pub fn ping(&mut self, value: u8) -> Ch376Result<bool, T> {
        let echoed = self.immediate(CMD11_CHECK_EXIST, &[value])?;
        Ok(echoed == !value)
    }

    pub fn ic_version(&mut self) -> Ch376Result<u8, T> {
        self.immediate(CMD01_GET_IC_VER, &[])
    }

    /// Returns whether the chip accepted the mode.
    pub fn set_mode(&mut self, mode: UsbMode) -> Ch376Result<bool, T> {
        let answer = self.immediate(CMD11_SET_USB_MODE, &[mode as u8])?;
        self.engine.delay_us(MODE_SWITCH_SETTLE_US);
        Ok(Status(answer) == Status::CMD_RET_SUCCESS)
    }

    pub fn set_speed(&mut self, speed: UsbSpeed) -> Ch376Result<(), T> {
        self.command(CMD10_SET_USB_SPEED, &[speed as u8])
    }

    /// Routes the interrupt onto the SDO pin for boards without a wired INT
    /// line. [`Self::init`] does this itself when configured to.
    pub fn route_interrupt_to_sdo(&mut self) -> Ch376Result<(), T> {
        self.command(CMD20_SET_SDO_INT, &SDO_INT_ENABLE)
    }

    /// Waits for the medium, mounts it and loads the drive info.
    ///
    /// USB media must signal a connect first. Mounting is retried only while
    /// the chip stays silent; a reported failure ends the attempt at once.
    pub fn attach(&mut self) -> Ch376Result<DriveInfo, T> {
        debug!("ch376: attaching {:?} medium", self.config.source);
        if self.config.source == DriveSource::Usb {
            self.set_mode(UsbMode::HostBusReset)?;
            self.set_mode(UsbMode::HostRun)?;
            match self.engine.wait_interrupt() {
                Ok(Status::USB_INT_CONNECT) => {}
                Ok(status) => return Err(self.abandon_attach(Ch376Error::Status(status))),
                Err(fault) => return Err(self.abandon_attach(fault.into())),
            }
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.engine.execute_with_signal(CMD0H_DISK_MOUNT, &[]) {
                Ok(Status::USB_INT_SUCCESS) => break,
                Ok(status) => return Err(self.abandon_attach(Ch376Error::Status(status))),
                Err(EngineFault::Timeout) if attempt < self.config.mount_attempts => {
                    debug!("ch376: mount attempt {} timed out", attempt);
                }
                Err(fault) => return Err(self.abandon_attach(fault.into())),
            }
        }

        self.error = None;
        self.attached = true;
        let drive = self.query_drive()?;
        debug!(
            "ch376: attached, {} of {} sectors free, {:?}",
            drive.free_sectors,
            drive.total_sectors,
            drive.file_system()
        );
        Ok(drive)
    }

    /// Drops the medium. Never fails; a USB host is put back to idle.
    pub fn detach(&mut self) {
        if self.config.source == DriveSource::Usb {
            let _ = self
                .engine
                .execute_immediate(CMD11_SET_USB_MODE, &[UsbMode::HostIdle as u8]);
            self.engine.delay_us(MODE_SWITCH_SETTLE_US);
        }
        if self.attached {
            debug!("ch376: detached");
        }
        self.attached = false;
        self.dir_depth = 0;
        self.answer = None;
        self.listing = super::driver::Listing::Idle;
        self.drive = DriveInfo::EMPTY;
        self.reset_file_container();
    }

    /// Switches between USB and SD media by detaching and reattaching.
    pub fn set_source(&mut self, source: DriveSource) -> Ch376Result<(), T> {
        if self.config.source == source {
            return Ok(());
        }
        debug!("ch376: switching source to {:?}", source);
        self.detach();
        self.config.source = source;
        self.enter_source_mode()?;
        self.attach().map(|_| ())
    }

    /// Re-checks the medium. An SD card is only probed from the root
    /// directory so an open file below it is not disturbed.
    pub fn drive_ready(&mut self) -> Ch376Result<bool, T> {
        if self.config.source == DriveSource::Sd {
            if self.dir_depth > 0 {
                return Ok(self.attached);
            }
            self.set_mode(UsbMode::HostIdle)?;
            self.set_mode(UsbMode::HostSd)?;
        }

        let mounted = match self.engine.execute_with_signal(CMD0H_DISK_MOUNT, &[]) {
            Ok(Status::USB_INT_SUCCESS) => Ok(()),
            Ok(status) => Err(Ch376Error::Status(status)),
            Err(EngineFault::Timeout) => Err(Ch376Error::Timeout),
            Err(fault) => return Err(self.fail(fault.into())),
        };
        if let Err(err) = mounted {
            let _ = self.fail(err);
            if self.config.source == DriveSource::Sd {
                self.detach();
            }
            return Ok(false);
        }

        self.query_drive()?;
        self.error = None;
        self.attached = true;
        Ok(true)
    }

    /// Drains pending interrupts and follows connect/disconnect events.
    /// Returns whether such an event was seen.
    pub fn check_int_message(&mut self) -> Ch376Result<bool, T> {
        let started = self.engine.now_ms();
        let mut last = None;
        loop {
            match self.engine.interrupt_pending() {
                Ok(true) => {}
                Ok(false) => break,
                Err(fault) => return Err(self.fail(fault.into())),
            }
            match self.engine.get_status() {
                Ok(status) => last = Some(status),
                Err(fault) => return Err(self.fail(fault.into())),
            }
            self.engine.delay_ms(INT_DRAIN_INTERVAL_MS);
            if self.engine.now_ms().wrapping_sub(started) > self.config.answer_timeout_ms {
                break;
            }
        }

        match last {
            Some(Status::USB_INT_CONNECT) => {
                if !self.attached {
                    if let Err(err) = self.attach() {
                        warn!("ch376: attach after connect failed: {:?}", err);
                    }
                }
                Ok(true)
            }
            Some(Status::USB_INT_DISCONNECT) => {
                if self.attached {
                    self.detach();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn enter_source_mode(&mut self) -> Ch376Result<(), T> {
        match self.config.source {
            DriveSource::Usb => {
                self.set_mode(UsbMode::HostIdle)?;
            }
            DriveSource::Sd => {
                self.set_mode(UsbMode::Default)?;
                self.set_mode(UsbMode::HostSd)?;
            }
        }
        Ok(())
    }

    /// `DISK_QUERY` followed by the 9-byte capacity record.
    fn query_drive(&mut self) -> Ch376Result<DriveInfo, T> {
        let status = self.signal(CMD0H_DISK_QUERY, &[])?;
        self.expect(status, &[Status::USB_INT_SUCCESS, Status::USB_INT_DISK_READ])?;
        let mut raw = [0u8; DRIVE_INFO_SIZE];
        let len = self.read_payload(&mut raw)?;
        self.drive = DriveInfo::from_bytes(&raw[..len]).unwrap_or(DriveInfo::EMPTY);
        Ok(self.drive)
    }

    fn abandon_attach(&mut self, err: Ch376Error<T::Error>) -> Ch376Error<T::Error> {
        warn!("ch376: attach failed: {:?}", err);
        self.detach();
        self.error = err.code();
        err
    }
}
