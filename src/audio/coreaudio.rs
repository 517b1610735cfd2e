use anyhow::{Result, bail};
use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio_sys::*;
use std::mem::size_of;
use std::os::raw::c_void;
use std::ptr;
use tracing::debug;

pub fn output_device_names() -> Result<Vec<String>> {
    let names: Vec<String> = device_ids()?
        .into_iter()
        .filter(|&device| has_output_streams(device))
        .filter_map(|device| match device_name(device) {
            Ok(name) => Some(name),
            Err(e) => {
                debug!("Skipping device {}: {:#}", device, e);
                None
            }
        })
        .collect();
    debug!("Enumerated {} output devices", names.len());
    Ok(names)
}

fn address(
    selector: AudioObjectPropertySelector,
    scope: AudioObjectPropertyScope,
) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: scope,
        mElement: kAudioObjectPropertyElementMain,
    }
}

fn check(status: OSStatus, what: &str) -> Result<()> {
    if status != kAudioHardwareNoError as OSStatus {
        bail!("CoreAudio {} failed ({})", what, status);
    }
    Ok(())
}

fn data_size(object: AudioObjectID, address: &AudioObjectPropertyAddress) -> Result<u32> {
    let mut size = 0u32;
    // SAFETY: address and size outlive the call; no qualifier is passed
    let status =
        unsafe { AudioObjectGetPropertyDataSize(object, address, 0, ptr::null(), &mut size) };
    check(status, "property size")?;
    Ok(size)
}

/// Fill `out` (at most `size` bytes) and return the number of bytes written
///
/// # Safety
/// `out` must point to at least `size` writable bytes, suitably aligned for
/// the property's type.
unsafe fn read_data(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    mut size: u32,
    out: *mut c_void,
) -> Result<u32> {
    let status =
        unsafe { AudioObjectGetPropertyData(object, address, 0, ptr::null(), &mut size, out) };
    check(status, "property read")?;
    Ok(size)
}

fn device_ids() -> Result<Vec<AudioDeviceID>> {
    let address = address(kAudioHardwarePropertyDevices, kAudioObjectPropertyScopeGlobal);
    let size = data_size(kAudioObjectSystemObject, &address)?;

    let mut devices: Vec<AudioDeviceID> = vec![0; size as usize / size_of::<AudioDeviceID>()];
    // SAFETY: the vector holds `size` bytes of AudioDeviceID
    let written = unsafe {
        read_data(
            kAudioObjectSystemObject,
            &address,
            size,
            devices.as_mut_ptr() as *mut c_void,
        )?
    };
    // Devices can vanish between the two calls
    devices.truncate(written as usize / size_of::<AudioDeviceID>());
    Ok(devices)
}

fn device_name(device: AudioDeviceID) -> Result<String> {
    let address = address(
        kAudioDevicePropertyDeviceNameCFString,
        kAudioObjectPropertyScopeGlobal,
    );
    let mut name: CFStringRef = ptr::null();
    // SAFETY: `name` is a single CFStringRef slot
    unsafe {
        read_data(
            device,
            &address,
            size_of::<CFStringRef>() as u32,
            &mut name as *mut CFStringRef as *mut c_void,
        )?;
    }
    if name.is_null() {
        bail!("device has no name");
    }
    // SAFETY: the getter returns a +1 reference that we now own
    let name = unsafe { CFString::wrap_under_create_rule(name) };
    Ok(name.to_string())
}

fn has_output_streams(device: AudioDeviceID) -> bool {
    let address = address(
        kAudioDevicePropertyStreamConfiguration,
        kAudioDevicePropertyScopeOutput,
    );
    let Ok(size) = data_size(device, &address) else {
        return false;
    };
    if (size as usize) < size_of::<AudioBufferList>() {
        return false;
    }

    // AudioBufferList is variable length; back it with u64s for alignment
    let mut buffer = vec![0u64; (size as usize).div_ceil(size_of::<u64>())];
    // SAFETY: buffer spans at least `size` bytes with 8-byte alignment
    let read = unsafe { read_data(device, &address, size, buffer.as_mut_ptr() as *mut c_void) };
    if read.is_err() {
        return false;
    }

    // SAFETY: CoreAudio wrote a valid AudioBufferList header into the buffer
    let list = unsafe { &*(buffer.as_ptr() as *const AudioBufferList) };
    list.mNumberBuffers > 0
}
