// 📷 Camera Controller - Scanning device lifecycle state machine
// Owns acquisition, pause/resume, torch control and the still-image decode
// side channel; the device itself stays behind a trait

use crate::events::{CoreEvent, EventSink, NullSink};
use log::warn;
use thiserror::Error;

// ============================================================================
// STATES
// ============================================================================

/// Lifecycle of the scanning device as seen by the caller.
///
/// `Loading` and `Error` are separate states so the view can distinguish
/// "still negotiating with the driver" from "failed, show the retry
/// affordance" without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    /// No device held
    Idle,

    /// Acquisition in flight
    Loading,

    /// Device held, decode callbacks flowing
    Scanning,

    /// Device held, decode callbacks suspended
    Paused,

    /// Acquisition failed; the operator must retry explicitly
    Error,
}

impl CameraState {
    pub fn name(&self) -> &'static str {
        match self {
            CameraState::Idle => "idle",
            CameraState::Loading => "loading",
            CameraState::Scanning => "scanning",
            CameraState::Paused => "paused",
            CameraState::Error => "error",
        }
    }
}

// ============================================================================
// DEVICE CONTRACT
// ============================================================================

/// Which physical camera to prefer when acquiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Back-facing ("environment") camera, the scanning default
    Back,
    Front,
}

/// Acquisition constraints handed to the driver
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub facing: Facing,

    /// Target decode attempts per second
    pub fps: u32,

    /// Decode region, width × height in pixels
    pub scan_box: (u32, u32),
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            facing: Facing::Back,
            fps: 10,
            scan_box: (220, 220),
        }
    }
}

/// What the acquired device can do beyond decoding
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// Flashlight/torch constraint available
    pub torch: bool,
}

/// Failures reported by the device driver
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device available")]
    NoDevice,

    #[error("camera device is busy")]
    Busy,

    #[error("device rejected the requested constraint")]
    ConstraintRejected,

    #[error("no code found in image")]
    NotFound,

    #[error("device failure: {0}")]
    Other(String),
}

/// The physical scanning device, as the controller consumes it.
///
/// Production wires this to the real driver; tests script it. Decoded text
/// is delivered by the driver through whatever callback the embedding wires
/// up — the controller only governs the lifecycle.
pub trait CameraDevice {
    /// Acquire and start decoding; returns the device capabilities
    fn start(&mut self, config: &CameraConfig) -> Result<Capabilities, DeviceError>;

    /// Release the device
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Suspend decode callbacks without releasing the device
    fn pause(&mut self, keep_last_frame: bool);

    /// Resume decode callbacks
    fn resume(&mut self);

    /// Flip the flashlight constraint
    fn set_torch(&mut self, on: bool) -> Result<(), DeviceError>;

    /// One-shot decode of a still image, independent of the live session
    fn decode_still(&mut self, image: &[u8]) -> Result<String, DeviceError>;
}

// ============================================================================
// CONTROLLER ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    /// Operation not valid in the current lifecycle state
    #[error("camera operation invalid while {}", .0.name())]
    InvalidState(CameraState),

    /// Acquisition failed; controller is now in the `Error` state
    #[error("camera start failed: {0}")]
    StartFailed(#[source] DeviceError),

    /// The device reports no flashlight capability
    #[error("torch is not supported by this device")]
    TorchUnsupported,

    /// The device rejected the torch constraint; torch state is unchanged
    #[error("torch toggle rejected: {0}")]
    TorchRejected(#[source] DeviceError),

    /// Still-image decode found no code (informational, no state change)
    #[error("no code found in image")]
    CodeNotFound,

    /// Still-image decode failed for another reason
    #[error("still-image decode failed: {0}")]
    DecodeFailed(#[source] DeviceError),
}

// ============================================================================
// CAMERA CONTROLLER
// ============================================================================

/// Explicit owned handle to the scanning device.
///
/// Every successful `start` is matched by a `stop`; dropping the controller
/// while the device is held releases it, so no exit path can leak an active
/// handle. `stop` is idempotent and safe to call redundantly.
pub struct CameraController {
    device: Box<dyn CameraDevice>,
    config: CameraConfig,
    state: CameraState,
    capabilities: Capabilities,
    torch_on: bool,
    sink: Box<dyn EventSink>,
}

impl CameraController {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self::with_config(device, CameraConfig::default())
    }

    pub fn with_config(device: Box<dyn CameraDevice>, config: CameraConfig) -> Self {
        CameraController {
            device,
            config,
            state: CameraState::Idle,
            capabilities: Capabilities::default(),
            torch_on: false,
            sink: Box::new(NullSink),
        }
    }

    /// Report state changes through `sink`
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Flashlight capability of the currently held device
    pub fn torch_supported(&self) -> bool {
        self.capabilities.torch
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    fn set_state(&mut self, state: CameraState) {
        self.state = state;
        self.sink.emit(CoreEvent::CameraStateChanged(state));
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Acquire the device and begin scanning.
    ///
    /// Valid from `Idle`, and from `Error` (explicit operator retry).
    /// Failure lands in the `Error` state and is never retried automatically.
    pub fn start(&mut self) -> Result<(), CameraError> {
        match self.state {
            CameraState::Idle | CameraState::Error => {}
            other => return Err(CameraError::InvalidState(other)),
        }

        self.set_state(CameraState::Loading);
        match self.device.start(&self.config) {
            Ok(capabilities) => {
                self.capabilities = capabilities;
                self.set_state(CameraState::Scanning);
                Ok(())
            }
            Err(err) => {
                self.set_state(CameraState::Error);
                Err(CameraError::StartFailed(err))
            }
        }
    }

    /// Release the device. Idempotent: a no-op unless the device is held.
    pub fn stop(&mut self) {
        match self.state {
            CameraState::Scanning | CameraState::Paused => {
                if let Err(err) = self.device.stop() {
                    warn!("error stopping scanner: {}", err);
                }
                self.capabilities = Capabilities::default();
                self.torch_on = false;
                self.set_state(CameraState::Idle);
            }
            // A failed acquisition holds no device; just re-arm
            CameraState::Error => self.set_state(CameraState::Idle),
            CameraState::Idle | CameraState::Loading => {}
        }
    }

    /// Suspend decode callbacks (used while a confirmation prompt is up).
    /// No-op outside `Scanning`.
    pub fn pause(&mut self) {
        if self.state == CameraState::Scanning {
            self.device.pause(true);
            self.set_state(CameraState::Paused);
        }
    }

    /// Resume decode callbacks. No-op outside `Paused`.
    pub fn resume(&mut self) {
        if self.state == CameraState::Paused {
            self.device.resume();
            self.set_state(CameraState::Scanning);
        }
    }

    // ========================================================================
    // TORCH
    // ========================================================================

    /// Flip the flashlight. Requires torch capability; a device rejection is
    /// non-fatal and leaves the recorded torch state unchanged.
    pub fn toggle_torch(&mut self) -> Result<bool, CameraError> {
        if !self.capabilities.torch {
            return Err(CameraError::TorchUnsupported);
        }

        let target = !self.torch_on;
        self.device
            .set_torch(target)
            .map_err(CameraError::TorchRejected)?;
        self.torch_on = target;
        Ok(target)
    }

    // ========================================================================
    // STILL-IMAGE DECODE
    // ========================================================================

    /// One-shot decode of an uploaded image. Works in any lifecycle state;
    /// "no code found" is informational, not a state change.
    pub fn decode_still_image(&mut self, image: &[u8]) -> Result<String, CameraError> {
        self.device.decode_still(image).map_err(|err| match err {
            DeviceError::NotFound => CameraError::CodeNotFound,
            other => CameraError::DecodeFailed(other),
        })
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        // A dangling active device handle is a resource leak; releasing here
        // makes every exit path equivalent to an explicit stop()
        if matches!(self.state, CameraState::Scanning | CameraState::Paused) {
            if let Err(err) = self.device.stop() {
                warn!("error releasing scanner on drop: {}", err);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::RecordingSink;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted device: records calls, fails on demand
    #[derive(Default)]
    struct MockState {
        calls: Vec<String>,
        running: bool,
        fail_start: Option<DeviceError>,
        torch_supported: bool,
        fail_torch: bool,
        still_result: Option<Result<String, DeviceError>>,
    }

    #[derive(Clone, Default)]
    struct MockDevice(Rc<RefCell<MockState>>);

    impl MockDevice {
        fn calls(&self) -> Vec<String> {
            self.0.borrow().calls.clone()
        }

        fn is_running(&self) -> bool {
            self.0.borrow().running
        }
    }

    impl CameraDevice for MockDevice {
        fn start(&mut self, config: &CameraConfig) -> Result<Capabilities, DeviceError> {
            let mut state = self.0.borrow_mut();
            state.calls.push(format!("start fps={}", config.fps));
            if let Some(err) = state.fail_start.clone() {
                return Err(err);
            }
            state.running = true;
            Ok(Capabilities {
                torch: state.torch_supported,
            })
        }

        fn stop(&mut self) -> Result<(), DeviceError> {
            let mut state = self.0.borrow_mut();
            state.calls.push("stop".to_string());
            state.running = false;
            Ok(())
        }

        fn pause(&mut self, keep_last_frame: bool) {
            self.0
                .borrow_mut()
                .calls
                .push(format!("pause keep={}", keep_last_frame));
        }

        fn resume(&mut self) {
            self.0.borrow_mut().calls.push("resume".to_string());
        }

        fn set_torch(&mut self, on: bool) -> Result<(), DeviceError> {
            let mut state = self.0.borrow_mut();
            state.calls.push(format!("torch {}", on));
            if state.fail_torch {
                return Err(DeviceError::ConstraintRejected);
            }
            Ok(())
        }

        fn decode_still(&mut self, _image: &[u8]) -> Result<String, DeviceError> {
            let mut state = self.0.borrow_mut();
            state.calls.push("decode_still".to_string());
            state
                .still_result
                .clone()
                .unwrap_or(Err(DeviceError::NotFound))
        }
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));

        assert_eq!(camera.state(), CameraState::Idle);
        camera.start().unwrap();
        assert_eq!(camera.state(), CameraState::Scanning);
        assert!(device.is_running());

        camera.stop();
        assert_eq!(camera.state(), CameraState::Idle);
        assert!(!device.is_running());
    }

    #[test]
    fn test_start_rejected_while_scanning() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));
        camera.start().unwrap();

        assert_eq!(
            camera.start(),
            Err(CameraError::InvalidState(CameraState::Scanning))
        );
        // No second acquisition happened
        assert_eq!(device.calls().iter().filter(|c| c.starts_with("start")).count(), 1);
    }

    #[test]
    fn test_start_failure_lands_in_error_and_retry_works() {
        let device = MockDevice::default();
        device.0.borrow_mut().fail_start = Some(DeviceError::PermissionDenied);
        let mut camera = CameraController::new(Box::new(device.clone()));

        let err = camera.start().unwrap_err();
        assert_eq!(err, CameraError::StartFailed(DeviceError::PermissionDenied));
        assert_eq!(camera.state(), CameraState::Error);

        // Explicit retry after the operator grants permission
        device.0.borrow_mut().fail_start = None;
        camera.start().unwrap();
        assert_eq!(camera.state(), CameraState::Scanning);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));

        camera.stop();
        camera.stop();
        assert_eq!(camera.state(), CameraState::Idle);
        assert!(device.calls().is_empty(), "no device call while idle");

        camera.start().unwrap();
        camera.stop();
        camera.stop();
        assert_eq!(
            device.calls().iter().filter(|c| *c == "stop").count(),
            1,
            "redundant stop must not reach the device"
        );
    }

    #[test]
    fn test_pause_resume() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));

        // No-ops outside their valid states
        camera.pause();
        camera.resume();
        assert!(device.calls().is_empty());

        camera.start().unwrap();
        camera.pause();
        assert_eq!(camera.state(), CameraState::Paused);
        camera.pause();
        camera.resume();
        assert_eq!(camera.state(), CameraState::Scanning);

        let calls = device.calls();
        assert_eq!(calls.iter().filter(|c| c.starts_with("pause")).count(), 1);
        assert_eq!(calls.iter().filter(|c| *c == "resume").count(), 1);
    }

    #[test]
    fn test_stop_from_paused_releases_device() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));

        camera.start().unwrap();
        camera.pause();
        camera.stop();

        assert_eq!(camera.state(), CameraState::Idle);
        assert!(!device.is_running());
    }

    #[test]
    fn test_torch_unsupported() {
        let device = MockDevice::default();
        let mut camera = CameraController::new(Box::new(device.clone()));
        camera.start().unwrap();

        assert!(!camera.torch_supported());
        assert_eq!(camera.toggle_torch(), Err(CameraError::TorchUnsupported));
    }

    #[test]
    fn test_torch_toggle_and_rejection() {
        let device = MockDevice::default();
        device.0.borrow_mut().torch_supported = true;
        let mut camera = CameraController::new(Box::new(device.clone()));
        camera.start().unwrap();

        assert!(camera.torch_supported());
        assert_eq!(camera.toggle_torch(), Ok(true));
        assert!(camera.torch_on());

        // Device rejection leaves the recorded torch state unchanged
        device.0.borrow_mut().fail_torch = true;
        assert_eq!(
            camera.toggle_torch(),
            Err(CameraError::TorchRejected(DeviceError::ConstraintRejected))
        );
        assert!(camera.torch_on());
    }

    #[test]
    fn test_torch_state_resets_on_stop() {
        let device = MockDevice::default();
        device.0.borrow_mut().torch_supported = true;
        let mut camera = CameraController::new(Box::new(device.clone()));

        camera.start().unwrap();
        camera.toggle_torch().unwrap();
        camera.stop();

        assert!(!camera.torch_supported());
        assert!(!camera.torch_on());
    }

    #[test]
    fn test_decode_still_image() {
        let device = MockDevice::default();
        device.0.borrow_mut().still_result = Some(Ok("BAT-042".to_string()));
        let mut camera = CameraController::new(Box::new(device.clone()));

        // Works without a live scanning session
        assert_eq!(camera.decode_still_image(&[1, 2, 3]).unwrap(), "BAT-042");
        assert_eq!(camera.state(), CameraState::Idle);

        device.0.borrow_mut().still_result = Some(Err(DeviceError::NotFound));
        assert_eq!(
            camera.decode_still_image(&[1, 2, 3]),
            Err(CameraError::CodeNotFound)
        );
    }

    #[test]
    fn test_drop_releases_device() {
        let device = MockDevice::default();
        {
            let mut camera = CameraController::new(Box::new(device.clone()));
            camera.start().unwrap();
            assert!(device.is_running());
        }
        assert!(!device.is_running(), "drop must release the device");
    }

    #[test]
    fn test_state_changes_reach_sink() {
        let device = MockDevice::default();
        let sink = RecordingSink::default();
        let mut camera = CameraController::new(Box::new(device));
        camera.set_sink(Box::new(sink.clone()));

        camera.start().unwrap();
        camera.pause();
        camera.resume();
        camera.stop();

        let states: Vec<CameraState> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                CoreEvent::CameraStateChanged(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                CameraState::Loading,
                CameraState::Scanning,
                CameraState::Paused,
                CameraState::Scanning,
                CameraState::Idle,
            ]
        );
    }
}
