//! Binding to the NDI SDK's shared library (cargo feature `ndi`).
//!
//! All unsafe code in the crate lives here. The binding mirrors the
//! SDK's struct layouts exactly at the FFI boundary; everything above
//! it works with the crate's own types. Library initialization is an
//! owned [`NdiRuntime`] value rather than the SDK's implicit
//! process-wide state, so teardown happens on every exit path.

#![allow(unsafe_code)]

use super::{DiscoveredSource, FrameDescriptor, FrameSource, Poll, SourceError};
use std::ffi::{c_char, c_void, CStr, CString};
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

#[allow(non_camel_case_types, non_snake_case)]
mod ffi {
    use std::ffi::{c_char, c_float, c_int, c_void};

    #[repr(C)]
    pub struct NDIlib_source_t {
        pub p_ndi_name: *const c_char,
        pub p_url_address: *const c_char,
    }

    #[repr(C)]
    pub struct NDIlib_find_create_t {
        pub show_local_sources: bool,
        pub p_groups: *const c_char,
        pub p_extra_ips: *const c_char,
    }

    #[repr(C)]
    pub struct NDIlib_video_frame_v2_t {
        pub xres: c_int,
        pub yres: c_int,
        pub FourCC: c_int,
        pub frame_rate_N: c_int,
        pub frame_rate_D: c_int,
        pub picture_aspect_ratio: c_float,
        pub timecode: i64,
        pub p_data: *mut c_void,
        pub line_stride_in_bytes: c_int,
        pub p_metadata: *const c_char,
        pub timestamp: i64,
    }

    // NDIlib_frame_type_e values returned by NDIlib_recv_capture_v2.
    pub const FRAME_TYPE_NONE: c_int = 0;
    pub const FRAME_TYPE_VIDEO: c_int = 1;
    pub const FRAME_TYPE_ERROR: c_int = 4;

    #[link(name = "ndi")]
    extern "C" {
        pub fn NDIlib_initialize() -> bool;
        pub fn NDIlib_destroy();
        pub fn NDIlib_find_create_v2(
            p_create_settings: *const NDIlib_find_create_t,
        ) -> *mut c_void;
        pub fn NDIlib_find_wait_for_sources(
            p_instance: *mut c_void,
            timeout_in_ms: u32,
        ) -> bool;
        pub fn NDIlib_find_get_current_sources(
            p_instance: *mut c_void,
            p_no_sources: *mut u32,
        ) -> *const NDIlib_source_t;
        pub fn NDIlib_find_destroy(p_instance: *mut c_void);
        pub fn NDIlib_recv_create_v2() -> *mut c_void;
        pub fn NDIlib_recv_connect(p_instance: *mut c_void, p_src: *const NDIlib_source_t);
        pub fn NDIlib_recv_capture_v2(
            p_instance: *mut c_void,
            p_video_data: *mut NDIlib_video_frame_v2_t,
            p_audio_data: *mut c_void,
            p_metadata: *mut c_void,
            timeout_in_ms: u32,
        ) -> c_int;
        pub fn NDIlib_recv_free_video_v2(
            p_instance: *mut c_void,
            p_video_data: *mut NDIlib_video_frame_v2_t,
        );
        pub fn NDIlib_recv_destroy(p_instance: *mut c_void);
    }
}

/// Owned handle to the NDI library's global state.
///
/// Initializes the library on construction and destroys it on drop.
/// Finders and receivers hold an `Arc` to the runtime so the library
/// outlives everything created from it.
pub struct NdiRuntime(());

impl NdiRuntime {
    /// Initializes the NDI library.
    pub fn new() -> Result<Self, SourceError> {
        // SAFETY: NDIlib_initialize has no preconditions.
        if unsafe { ffi::NDIlib_initialize() } {
            Ok(Self(()))
        } else {
            Err(SourceError::InitFailed(
                "NDIlib_initialize returned false".into(),
            ))
        }
    }
}

impl Drop for NdiRuntime {
    fn drop(&mut self) {
        // SAFETY: paired with the NDIlib_initialize call in `new`.
        unsafe { ffi::NDIlib_destroy() };
    }
}

/// Discovers NDI sources on the local network.
pub struct NdiFinder {
    _runtime: Arc<NdiRuntime>,
    handle: *mut c_void,
}

impl NdiFinder {
    /// Creates a finder that also reports sources on this machine.
    pub fn new(runtime: &Arc<NdiRuntime>) -> Result<Self, SourceError> {
        let settings = ffi::NDIlib_find_create_t {
            show_local_sources: true,
            p_groups: ptr::null(),
            p_extra_ips: ptr::null(),
        };
        // SAFETY: settings is valid for the duration of the call; the
        // SDK copies what it keeps.
        let handle = unsafe { ffi::NDIlib_find_create_v2(&settings) };
        if handle.is_null() {
            return Err(SourceError::DiscoveryFailed(
                "NDIlib_find_create_v2 returned null".into(),
            ));
        }
        Ok(Self {
            _runtime: Arc::clone(runtime),
            handle,
        })
    }

    /// Waits up to `timeout` for the source list to settle, then
    /// returns the sources currently visible.
    pub fn wait_for_sources(&self, timeout: Duration) -> Vec<DiscoveredSource> {
        // SAFETY: handle is valid until drop.
        unsafe { ffi::NDIlib_find_wait_for_sources(self.handle, clamp_timeout(timeout)) };

        let mut count: u32 = 0;
        // SAFETY: the returned array of `count` entries is owned by the
        // finder and stays valid until the next finder call; every
        // entry is copied out before this method returns.
        let entries = unsafe { ffi::NDIlib_find_get_current_sources(self.handle, &mut count) };
        if entries.is_null() {
            return Vec::new();
        }

        let mut sources = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            // SAFETY: i < count, so the entry is within the array.
            let entry = unsafe { &*entries.add(i) };
            sources.push(DiscoveredSource {
                name: copy_c_str(entry.p_ndi_name),
                address: copy_c_str(entry.p_url_address),
            });
        }
        sources
    }
}

impl Drop for NdiFinder {
    fn drop(&mut self) {
        // SAFETY: handle is valid and not used after this.
        unsafe { ffi::NDIlib_find_destroy(self.handle) };
    }
}

/// A connected NDI receiver, polled for frame metadata.
///
/// Each successfully captured frame is freed back to the SDK exactly
/// once, before the poll returns; only the frame's metadata crosses
/// the boundary.
pub struct NdiSource {
    _runtime: Arc<NdiRuntime>,
    recv: *mut c_void,
    _name: CString,
    _address: CString,
    last_size: u64,
}

impl NdiSource {
    /// Creates a receiver and connects it to the given source.
    pub fn connect(
        runtime: &Arc<NdiRuntime>,
        source: &DiscoveredSource,
    ) -> Result<Self, SourceError> {
        let name = CString::new(source.name.as_str())
            .map_err(|e| SourceError::ConnectFailed(e.to_string()))?;
        let address = CString::new(source.address.as_str())
            .map_err(|e| SourceError::ConnectFailed(e.to_string()))?;

        // SAFETY: no preconditions.
        let recv = unsafe { ffi::NDIlib_recv_create_v2() };
        if recv.is_null() {
            return Err(SourceError::ConnectFailed(
                "NDIlib_recv_create_v2 returned null".into(),
            ));
        }

        let raw = ffi::NDIlib_source_t {
            p_ndi_name: name.as_ptr(),
            p_url_address: address.as_ptr(),
        };
        // SAFETY: recv is valid; raw points at CStrings owned by the
        // value returned below, which outlives the connection.
        unsafe { ffi::NDIlib_recv_connect(recv, &raw) };

        Ok(Self {
            _runtime: Arc::clone(runtime),
            recv,
            _name: name,
            _address: address,
            last_size: 0,
        })
    }
}

impl FrameSource for NdiSource {
    fn poll(&mut self, timeout: Duration) -> Result<Poll, SourceError> {
        let mut frame = MaybeUninit::<ffi::NDIlib_video_frame_v2_t>::zeroed();
        // SAFETY: recv is valid; frame is writable; audio and metadata
        // captures are disabled by passing null.
        let kind = unsafe {
            ffi::NDIlib_recv_capture_v2(
                self.recv,
                frame.as_mut_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
                clamp_timeout(timeout),
            )
        };
        match kind {
            ffi::FRAME_TYPE_VIDEO => {
                // SAFETY: the SDK filled the frame for a video capture.
                let mut frame = unsafe { frame.assume_init() };
                let descriptor = FrameDescriptor {
                    width: frame.xres,
                    height: frame.yres,
                    frame_rate_n: frame.frame_rate_N,
                    frame_rate_d: frame.frame_rate_D,
                    fourcc: frame.FourCC as u32,
                    data_size: frame.line_stride_in_bytes.max(0) as u64
                        * frame.yres.max(0) as u64,
                };
                // SAFETY: frees the captured frame exactly once.
                unsafe { ffi::NDIlib_recv_free_video_v2(self.recv, &mut frame) };
                self.last_size = descriptor.data_size;
                Ok(Poll::Frame(descriptor))
            }
            ffi::FRAME_TYPE_NONE => Ok(Poll::Pending),
            ffi::FRAME_TYPE_ERROR => Err(SourceError::CaptureFailed(
                "NDIlib_recv_capture_v2 reported a connection error".into(),
            )),
            // Audio, metadata and status-change frames carry nothing
            // this monitor tracks.
            _ => Ok(Poll::Pending),
        }
    }

    fn last_frame_size(&mut self) -> Result<u64, SourceError> {
        Ok(self.last_size)
    }
}

impl Drop for NdiSource {
    fn drop(&mut self) {
        // SAFETY: recv is valid and not used after this.
        unsafe { ffi::NDIlib_recv_destroy(self.recv) };
    }
}

// SAFETY: the receiver handle is only ever used from one thread at a
// time; the sampling loop owns the source exclusively while running.
unsafe impl Send for NdiSource {}

fn clamp_timeout(timeout: Duration) -> u32 {
    timeout.as_millis().min(u128::from(u32::MAX)) as u32
}

fn copy_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: the SDK hands out NUL-terminated strings.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
