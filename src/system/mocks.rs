use anyhow::{Result, bail};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::system::traits::{AudioDeviceSource, CpuSampler, FileSystemInterface};

#[derive(Default)]
struct FsState {
    files: HashMap<PathBuf, (String, SystemTime)>,
    writes: u64,
    read_calls: Vec<PathBuf>,
    write_calls: Vec<(PathBuf, String)>,
    dir_calls: Vec<PathBuf>,
    fail_read: bool,
    fail_write: bool,
    fail_create_dir: bool,
}

impl FsState {
    /// Each write stamps the file 1000s later than the previous one,
    /// starting at epoch + 1000s
    fn store(&mut self, path: &Path, content: &str) {
        self.writes += 1;
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1000 * self.writes);
        self.files
            .insert(path.to_path_buf(), (content.to_string(), stamp));
    }
}

/// In-memory file system recording every call. Clones share state.
#[derive(Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<FsState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FsState> {
        self.state.lock().unwrap()
    }

    /// Place a file without recording a write call
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        self.state().store(path.as_ref(), &content);
    }

    pub fn file_content<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|(content, _)| content.clone())
    }

    pub fn get_read_calls(&self) -> Vec<PathBuf> {
        self.state().read_calls.clone()
    }

    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.state().write_calls.clone()
    }

    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.state().dir_calls.clone()
    }

    pub fn set_read_failure(&self, should_fail: bool) {
        self.state().fail_read = should_fail;
    }

    pub fn set_write_failure(&self, should_fail: bool) {
        self.state().fail_write = should_fail;
    }

    pub fn set_create_dir_failure(&self, should_fail: bool) {
        self.state().fail_create_dir = should_fail;
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        let mut state = self.state();
        state.read_calls.push(path.to_path_buf());
        if state.fail_read {
            bail!("Mock read failure");
        }
        match state.files.get(path) {
            Some((content, _)) => Ok(content.clone()),
            None => bail!("File not found: {}", path.display()),
        }
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut state = self.state();
        state
            .write_calls
            .push((path.to_path_buf(), content.to_string()));
        if state.fail_write {
            bail!("Mock write failure");
        }
        state.store(path, content);
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        state.dir_calls.push(path.to_path_buf());
        if state.fail_create_dir {
            bail!("Mock create directory failure");
        }
        Ok(())
    }

    fn get_modified_time(&self, path: &Path) -> Result<SystemTime> {
        match self.state().files.get(path) {
            Some((_, modified)) => Ok(*modified),
            None => bail!("File not found: {}", path.display()),
        }
    }
}

/// Mock audio device source - the attached devices are set by the test
#[derive(Clone, Default)]
pub struct MockAudioDeviceSource {
    pub devices: Arc<Mutex<Vec<String>>>,
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockAudioDeviceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, name: &str) {
        self.devices.lock().unwrap().push(name.to_string());
    }

    pub fn disconnect(&self, name: &str) {
        self.devices.lock().unwrap().retain(|device| device != name);
    }

    pub fn set_failure(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }
}

impl AudioDeviceSource for MockAudioDeviceSource {
    fn output_device_names(&self) -> Result<Vec<String>> {
        if *self.should_fail.lock().unwrap() {
            bail!("Mock enumeration failure");
        }
        Ok(self.devices.lock().unwrap().clone())
    }
}

/// Mock CPU sampler - replays queued readings, then repeats the fallback
#[derive(Clone)]
pub struct MockCpuSampler {
    pub readings: Arc<Mutex<VecDeque<f64>>>,
    pub fallback: Arc<Mutex<f64>>,
    pub sample_calls: Arc<Mutex<usize>>,
}

impl MockCpuSampler {
    pub fn new(fallback: f64) -> Self {
        Self {
            readings: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(fallback)),
            sample_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn push_readings(&self, readings: &[f64]) {
        self.readings.lock().unwrap().extend(readings.iter().copied());
    }

    pub fn set_fallback(&self, usage: f64) {
        *self.fallback.lock().unwrap() = usage;
    }

    pub fn sample_count(&self) -> usize {
        *self.sample_calls.lock().unwrap()
    }
}

impl CpuSampler for MockCpuSampler {
    fn sample_cpu_usage(&self) -> Result<f64> {
        *self.sample_calls.lock().unwrap() += 1;
        let next = self.readings.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| *self.fallback.lock().unwrap()))
    }
}
