//! Solver configuration and the JSON initialization parameter object.
use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::solver::SolverError;

/// Restart and learnt clause limit policy.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ControllerKind {
    /// MiniSat 1 style geometric restarts.
    Minisat1,
    /// MiniSat 2 style Luby restarts.
    Minisat2,
}

/// Conflict analysis variant.
///
/// Both names select the same first-UIP analysis; `uip2` is accepted for compatibility with
/// configurations written for older engine generations.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AnalyzerKind {
    Uip1,
    Uip2,
}

/// Fallback polarity used when the phase cache has no value for a variable.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PolarityMode {
    /// Always decide the positive literal.
    Posi,
    /// Always decide the negative literal.
    Nega,
    /// Decide the polarity with the larger watcher list.
    WlPosi,
    /// Decide the polarity with the smaller watcher list.
    WlNega,
    /// Decide a uniformly random polarity.
    Random,
}

/// Decision literal selection.
#[derive(Copy, Clone, Debug)]
pub struct SelectorConfig {
    pub polarity: PolarityMode,
    /// Probability of picking a random heap entry instead of the maximum activity variable.
    pub var_freq: f64,
    /// Reuse the last assigned value of a variable as decision polarity.
    pub phase_cache: bool,
}

impl Default for SelectorConfig {
    fn default() -> SelectorConfig {
        SelectorConfig {
            polarity: PolarityMode::Nega,
            var_freq: 0.0,
            phase_cache: true,
        }
    }
}

/// Configurable parameters used during solving.
#[derive(Copy, Clone, Debug)]
pub struct SolverConfig {
    pub controller: ControllerKind,
    pub analyzer: AnalyzerKind,
    pub selector: SelectorConfig,
    /// Multiplicative decay for the VSIDS decision heuristic.
    pub var_decay: f64,
    /// Multiplicative decay for clause activities.
    pub clause_decay: f32,
    /// Seed of the engine internal random number generator. Must not be zero.
    pub random_seed: f64,
    /// Emit progress messages through the `log` crate while solving.
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            controller: ControllerKind::Minisat2,
            analyzer: AnalyzerKind::Uip1,
            selector: SelectorConfig::default(),
            var_decay: 0.95,
            clause_decay: 0.999,
            random_seed: 91_648_253.0,
            verbose: false,
        }
    }
}

/// Engine type names accepted for backwards compatibility.
///
/// All of them map to the one engine implemented by this crate; the names that used to select
/// MiniSat 1 era engines imply the geometric controller.
const ENGINE_TYPES: &[(&str, ControllerKind)] = &[
    ("ymsat", ControllerKind::Minisat2),
    ("ymsat1", ControllerKind::Minisat1),
    ("ymsat2", ControllerKind::Minisat2),
    ("ymsat1_old", ControllerKind::Minisat1),
    ("ymsat2old", ControllerKind::Minisat2),
    ("minisat", ControllerKind::Minisat1),
    ("minisat2", ControllerKind::Minisat2),
    ("glueminisat2", ControllerKind::Minisat2),
];

/// The default engine type name reported when none is configured.
const DEFAULT_ENGINE_TYPE: &str = "ymsat2";

/// Raw JSON shape of the initialization parameter object.
#[derive(Deserialize, Default)]
struct RawInitParam {
    #[serde(rename = "type", default)]
    engine: Option<String>,
    #[serde(default)]
    controller: Option<String>,
    #[serde(default)]
    analyzer: Option<String>,
    #[serde(default)]
    selector: Option<RawSelector>,
    #[serde(default)]
    verbose: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelector {
    Name(String),
    Object {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        var_freq: Option<f64>,
        #[serde(default)]
        phase_cache: Option<bool>,
    },
}

/// Validated solver initialization parameters.
///
/// This is the JSON-equivalent parameter object accepted by [`Solver`](crate::solver::Solver)
/// constructors. When no explicit parameters are given, [`SatInitParam::from_env`] discovers a
/// configuration file from the environment:
///
///  1. `$YMSAT_CONF` names a JSON file,
///  2. `$YMSAT_CONFDIR/ymsat.json`,
///  3. `./ymsat.json`,
///  4. the hard-coded defaults.
///
/// Files that cannot be read or parsed are silently skipped during discovery. Reading an explicit
/// file with [`SatInitParam::from_json_file`] reports such problems instead.
#[derive(Clone, Debug)]
pub struct SatInitParam {
    engine_type: String,
    config: SolverConfig,
}

impl Default for SatInitParam {
    fn default() -> SatInitParam {
        SatInitParam {
            engine_type: DEFAULT_ENGINE_TYPE.to_owned(),
            config: SolverConfig::default(),
        }
    }
}

impl SatInitParam {
    /// Build parameters from an engine type name only.
    pub fn from_type(engine_type: &str) -> Result<SatInitParam, SolverError> {
        let raw = RawInitParam {
            engine: Some(engine_type.to_owned()),
            ..RawInitParam::default()
        };
        SatInitParam::from_raw(raw)
    }

    /// Build parameters from a parsed JSON value.
    ///
    /// A JSON string is interpreted as an engine type name, a JSON object as the full parameter
    /// object and `null` as the hard-coded defaults.
    pub fn from_value(value: serde_json::Value) -> Result<SatInitParam, SolverError> {
        match value {
            serde_json::Value::Null => Ok(SatInitParam::default()),
            serde_json::Value::String(engine_type) => SatInitParam::from_type(&engine_type),
            value @ serde_json::Value::Object(_) => {
                let raw: RawInitParam = serde_json::from_value(value).map_err(|err| {
                    SolverError::Configuration(format!("invalid parameter object: {}", err))
                })?;
                SatInitParam::from_raw(raw)
            }
            value => Err(SolverError::Configuration(format!(
                "parameter object must be a string or object, got {}",
                value
            ))),
        }
    }

    /// Parse parameters from a JSON string.
    pub fn from_json_str(json: &str) -> Result<SatInitParam, SolverError> {
        let value = serde_json::from_str(json)
            .map_err(|err| SolverError::Configuration(format!("invalid JSON: {}", err)))?;
        SatInitParam::from_value(value)
    }

    /// Read parameters from a JSON file, reporting read and parse failures.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<SatInitParam, SolverError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|err| {
            SolverError::Configuration(format!("could not read {}: {}", path.display(), err))
        })?;
        let value = serde_json::from_str(&data).map_err(|err| {
            SolverError::Configuration(format!("could not parse {}: {}", path.display(), err))
        })?;
        SatInitParam::from_value(value)
    }

    /// Discover parameters from the environment.
    pub fn from_env() -> Result<SatInitParam, SolverError> {
        if let Ok(path) = env::var("YMSAT_CONF") {
            if let Some(value) = read_json_value(Path::new(&path)) {
                return SatInitParam::from_value(value);
            }
        }

        if let Ok(dir) = env::var("YMSAT_CONFDIR") {
            if let Some(value) = read_json_value(&Path::new(&dir).join("ymsat.json")) {
                return SatInitParam::from_value(value);
            }
        }

        if let Some(value) = read_json_value(Path::new("./ymsat.json")) {
            return SatInitParam::from_value(value);
        }

        Ok(SatInitParam::default())
    }

    /// The configured engine type name.
    pub fn engine_type(&self) -> &str {
        &self.engine_type
    }

    /// The solver configuration resulting from these parameters.
    pub fn solver_config(&self) -> SolverConfig {
        self.config
    }

    fn from_raw(raw: RawInitParam) -> Result<SatInitParam, SolverError> {
        let mut config = SolverConfig::default();

        let engine_type = match raw.engine {
            None => DEFAULT_ENGINE_TYPE.to_owned(),
            Some(engine) => {
                match ENGINE_TYPES.iter().find(|(name, _)| *name == engine) {
                    None => {
                        return Err(SolverError::Configuration(format!(
                            "unknown engine type '{}'",
                            engine
                        )))
                    }
                    Some(&(_, controller)) => config.controller = controller,
                }
                engine
            }
        };

        if let Some(controller) = raw.controller {
            config.controller = match controller.as_str() {
                "minisat1" => ControllerKind::Minisat1,
                "minisat2" => ControllerKind::Minisat2,
                _ => {
                    return Err(SolverError::Configuration(format!(
                        "unknown controller '{}'",
                        controller
                    )))
                }
            };
        }

        if let Some(analyzer) = raw.analyzer {
            config.analyzer = match analyzer.as_str() {
                "uip1" => AnalyzerKind::Uip1,
                "uip2" => AnalyzerKind::Uip2,
                _ => {
                    return Err(SolverError::Configuration(format!(
                        "unknown analyzer '{}'",
                        analyzer
                    )))
                }
            };
        }

        if let Some(selector) = raw.selector {
            let (kind, var_freq, phase_cache) = match selector {
                RawSelector::Name(kind) => (kind, None, None),
                RawSelector::Object {
                    kind,
                    var_freq,
                    phase_cache,
                } => (kind, var_freq, phase_cache),
            };

            config.selector.polarity = match kind.as_str() {
                "posi" => PolarityMode::Posi,
                "nega" => PolarityMode::Nega,
                "wlposi" => PolarityMode::WlPosi,
                "wlnega" => PolarityMode::WlNega,
                "random" => PolarityMode::Random,
                _ => {
                    return Err(SolverError::Configuration(format!(
                        "unknown selector '{}'",
                        kind
                    )))
                }
            };

            if let Some(var_freq) = var_freq {
                if !(0.0..=1.0).contains(&var_freq) {
                    return Err(SolverError::Configuration(format!(
                        "var_freq {} is not a probability",
                        var_freq
                    )));
                }
                config.selector.var_freq = var_freq;
            }

            if let Some(phase_cache) = phase_cache {
                config.selector.phase_cache = phase_cache;
            }
        }

        if let Some(verbose) = raw.verbose {
            config.verbose = verbose;
        }

        Ok(SatInitParam {
            engine_type,
            config,
        })
    }
}

/// Read and parse a JSON file, returning `None` when that is not possible.
fn read_json_value(path: &Path) -> Option<serde_json::Value> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_param() {
        let param = SatInitParam::default();
        assert_eq!(param.engine_type(), "ymsat2");
        let config = param.solver_config();
        assert_eq!(config.controller, ControllerKind::Minisat2);
        assert_eq!(config.analyzer, AnalyzerKind::Uip1);
        assert_eq!(config.selector.polarity, PolarityMode::Nega);
        assert!(config.selector.phase_cache);
    }

    #[test]
    fn legacy_engine_types() {
        for &engine in &["ymsat", "ymsat1", "ymsat2", "ymsat1_old", "ymsat2old"] {
            let param = SatInitParam::from_type(engine).unwrap();
            assert_eq!(param.engine_type(), engine);
        }

        let param = SatInitParam::from_type("minisat").unwrap();
        assert_eq!(param.solver_config().controller, ControllerKind::Minisat1);

        let param = SatInitParam::from_type("glueminisat2").unwrap();
        assert_eq!(param.solver_config().controller, ControllerKind::Minisat2);

        assert!(SatInitParam::from_type("lingeling").is_err());
        assert!(SatInitParam::from_type("picosat").is_err());
    }

    #[test]
    fn full_parameter_object() {
        let param = SatInitParam::from_json_str(
            r#"{
                "type": "ymsat2",
                "controller": "minisat1",
                "analyzer": "uip2",
                "selector": {"type": "wlnega", "var_freq": 0.02, "phase_cache": false},
                "verbose": true
            }"#,
        )
        .unwrap();

        let config = param.solver_config();
        assert_eq!(config.controller, ControllerKind::Minisat1);
        assert_eq!(config.analyzer, AnalyzerKind::Uip2);
        assert_eq!(config.selector.polarity, PolarityMode::WlNega);
        assert!((config.selector.var_freq - 0.02).abs() < 1e-9);
        assert!(!config.selector.phase_cache);
        assert!(config.verbose);
    }

    #[test]
    fn selector_shorthand() {
        let param = SatInitParam::from_json_str(r#"{"selector": "random"}"#).unwrap();
        assert_eq!(
            param.solver_config().selector.polarity,
            PolarityMode::Random
        );

        assert!(SatInitParam::from_json_str(r#"{"selector": "fancy"}"#).is_err());
        assert!(SatInitParam::from_json_str(r#"{"selector": {"type": "nega", "var_freq": 2.0}}"#)
            .is_err());
    }

    #[test]
    fn discovery_from_env() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"type": "minisat", "verbose": true}}"#).unwrap();
        drop(file);

        env::set_var("YMSAT_CONF", &path);
        let param = SatInitParam::from_env().unwrap();
        env::remove_var("YMSAT_CONF");

        assert_eq!(param.engine_type(), "minisat");
        assert_eq!(param.solver_config().controller, ControllerKind::Minisat1);
        assert!(param.solver_config().verbose);

        // Unreadable files are skipped silently during discovery.
        env::set_var("YMSAT_CONF", dir.path().join("does-not-exist.json"));
        let param = SatInitParam::from_env().unwrap();
        env::remove_var("YMSAT_CONF");

        assert_eq!(param.engine_type(), "ymsat2");
    }

    #[test]
    fn json_string_is_engine_type() {
        let param = SatInitParam::from_json_str(r#""minisat2""#).unwrap();
        assert_eq!(param.engine_type(), "minisat2");

        assert!(SatInitParam::from_json_str("42").is_err());
        assert!(SatInitParam::from_json_str("{").is_err());
    }
}
