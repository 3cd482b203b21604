// COMMIT bridge
// COMMIT is a python library, so the filter keeps one interpreter alive for the whole run and
// drives a single evaluation object through a line-delimited JSON protocol. The driver script is
// embedded in the binary and started with `python -u -c`.

use crate::backend::{CommitBackend, DictionaryRequest};
use crate::coefficients::{read_coefficients, RAW_EXTENSION};
use crate::error::{FilterError, Result};
use crate::forward_model::{FitSettings, ForwardModel};
use crate::regularisation::Regularisation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

const DRIVER: &str = include_str!("../driver/commit_bridge.py");

/// coefficients of the last fit are exchanged through this file in the scratch directory
const COEFF_FILE_STEM: &str = "x_nnls";

#[derive(Serialize, Debug)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    BuildDictionary(&'a DictionaryRequest),
    LoadData {
        dwi_filename: &'a Path,
        scheme_filename: &'a Path,
    },
    SetModel {
        name: &'static str,
        d_par: f64,
        d_perps_zep: &'a [f64],
        d_isos: &'a [f64],
    },
    GenerateKernels {
        regenerate: bool,
    },
    LoadKernels,
    LoadDictionary {
        path: &'a Path,
    },
    SetThreads {
        n: Option<usize>,
    },
    BuildOperator,
    Fit {
        tol_fun: f64,
        max_iter: usize,
        verbose: bool,
        regularisation: Option<&'a Regularisation>,
    },
    SaveResults {
        path_suffix: &'a str,
    },
    GetCoeffs {
        path: &'a Path,
    },
    Shutdown,
}

impl Request<'_> {
    fn op(&self) -> &'static str {
        match self {
            Request::BuildDictionary(_) => "build_dictionary",
            Request::LoadData { .. } => "load_data",
            Request::SetModel { .. } => "set_model",
            Request::GenerateKernels { .. } => "generate_kernels",
            Request::LoadKernels => "load_kernels",
            Request::LoadDictionary { .. } => "load_dictionary",
            Request::SetThreads { .. } => "set_threads",
            Request::BuildOperator => "build_operator",
            Request::Fit { .. } => "fit",
            Request::SaveResults { .. } => "save_results",
            Request::GetCoeffs { .. } => "get_coeffs",
            Request::Shutdown => "shutdown",
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
struct Response {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    n: Option<usize>,
}

/// A running python interpreter hosting one COMMIT evaluation.
pub struct PythonBridge {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    scratch_dir: PathBuf,
}

impl PythonBridge {
    /// Starts `python` with the working directory set to `working_dir`, where COMMIT resolves
    /// its study and subject paths. Coefficients are exchanged through a file in `scratch_dir`.
    pub fn spawn(python: &str, working_dir: &Path, scratch_dir: &Path) -> Result<Self> {
        Self::with_command(Command::new(python), working_dir, scratch_dir)
    }

    /// Like `spawn`, for an interpreter command that carries its own environment, such as a
    /// `PYTHONPATH` pointing at a COMMIT checkout.
    pub fn with_command(
        mut python: Command,
        working_dir: &Path,
        scratch_dir: &Path,
    ) -> Result<Self> {
        let program = python.get_program().to_string_lossy().into_owned();
        log::debug!("starting COMMIT bridge with {} in {}", program, working_dir.display());
        let mut child = python
            .arg("-u")
            .arg("-c")
            .arg(DRIVER)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FilterError::Bridge(format!("failed to start {program}: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take()
            .ok_or_else(|| FilterError::Bridge("bridge stdout is not captured".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            scratch_dir: scratch_dir.to_path_buf(),
        })
    }

    fn call(&mut self, request: &Request) -> Result<Response> {
        let op = request.op();
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let now = Instant::now();
        let stdin = self.stdin.as_mut()
            .ok_or_else(|| FilterError::Bridge("bridge is shut down".to_string()))?;
        stdin.write_all(line.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(|e| FilterError::Bridge(format!("failed to send {op}: {e}")))?;

        let mut reply = String::new();
        let n = self.stdout.read_line(&mut reply)
            .map_err(|e| FilterError::Bridge(format!("failed to read reply to {op}: {e}")))?;
        if n == 0 {
            let status = self.child.wait()
                .map(|s| s.to_string())
                .unwrap_or_else(|e| e.to_string());
            return Err(FilterError::Bridge(format!("process exited during {op} ({status})")));
        }
        log::debug!("{} took {:.03} secs", op, now.elapsed().as_secs_f32());

        let response: Response = serde_json::from_str(&reply)?;
        check(op, response)
    }

    /// asks the driver to exit and waits for the process
    pub fn shutdown(mut self) -> Result<()> {
        self.call(&Request::Shutdown)?;
        self.stdin.take();
        let status = self.child.wait()
            .map_err(|e| FilterError::Bridge(format!("failed to wait for bridge: {e}")))?;
        if !status.success() {
            return Err(FilterError::Bridge(format!("bridge exited with {status}")));
        }
        Ok(())
    }

    pub fn coefficient_file(&self) -> PathBuf {
        self.scratch_dir.join(COEFF_FILE_STEM).with_extension(RAW_EXTENSION)
    }
}

impl Drop for PythonBridge {
    fn drop(&mut self) {
        // closing stdin ends the driver's request loop
        if self.stdin.take().is_some() {
            let _ = self.child.wait();
        }
    }
}

fn set_model_request(model: &ForwardModel) -> Request<'_> {
    Request::SetModel {
        name: ForwardModel::NAME,
        d_par: model.d_par,
        d_perps_zep: &model.d_perps_zep,
        d_isos: &model.d_isos,
    }
}

fn fit_request<'a>(
    settings: &FitSettings,
    regularisation: Option<&'a Regularisation>,
) -> Request<'a> {
    Request::Fit {
        tol_fun: settings.tol_fun,
        max_iter: settings.max_iter,
        verbose: settings.verbose,
        regularisation,
    }
}

fn check(op: &str, response: Response) -> Result<Response> {
    if response.ok {
        Ok(response)
    } else {
        Err(FilterError::Library {
            op: op.to_string(),
            message: response.error.unwrap_or_else(|| "no error message".to_string()),
        })
    }
}

impl CommitBackend for PythonBridge {
    fn build_dictionary(&mut self, request: &DictionaryRequest) -> Result<()> {
        self.call(&Request::BuildDictionary(request)).map(|_| ())
    }

    fn load_data(&mut self, dwi_filename: &Path, scheme_filename: &Path) -> Result<()> {
        self.call(&Request::LoadData { dwi_filename, scheme_filename }).map(|_| ())
    }

    fn set_model(&mut self, model: &ForwardModel) -> Result<()> {
        self.call(&set_model_request(model)).map(|_| ())
    }

    fn generate_kernels(&mut self, regenerate: bool) -> Result<()> {
        self.call(&Request::GenerateKernels { regenerate }).map(|_| ())
    }

    fn load_kernels(&mut self) -> Result<()> {
        self.call(&Request::LoadKernels).map(|_| ())
    }

    fn load_dictionary(&mut self, path: &Path) -> Result<()> {
        self.call(&Request::LoadDictionary { path }).map(|_| ())
    }

    fn set_threads(&mut self, n_threads: Option<usize>) -> Result<()> {
        self.call(&Request::SetThreads { n: n_threads }).map(|_| ())
    }

    fn build_operator(&mut self) -> Result<()> {
        self.call(&Request::BuildOperator).map(|_| ())
    }

    fn fit(
        &mut self,
        settings: &FitSettings,
        regularisation: Option<&Regularisation>,
    ) -> Result<()> {
        self.call(&fit_request(settings, regularisation)).map(|_| ())
    }

    fn save_results(&mut self, path_suffix: &str) -> Result<()> {
        self.call(&Request::SaveResults { path_suffix }).map(|_| ())
    }

    fn coefficients(&mut self) -> Result<Vec<f64>> {
        let path = self.coefficient_file();
        let response = self.call(&Request::GetCoeffs { path: &path })?;
        // the exchange file is not a result of the run
        let x = read_coefficients(&path);
        let removed = fs::remove_file(&path);
        let x = x?;
        removed.map_err(|e| FilterError::io(&path, e))?;
        if let Some(n) = response.n {
            if n != x.len() {
                return Err(FilterError::Coefficients {
                    path,
                    reason: format!("bridge reported {} values but the file holds {}", n, x.len()),
                });
            }
        }
        Ok(x)
    }
}
