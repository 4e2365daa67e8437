//! Native capability bridge.
//!
//! The evaluator is side-effect free; the functions registered here are the
//! whole surface through which a spec can observe the host. Names, parameter
//! lists and return shapes are a fixed contract with the `.libsonnet` code that
//! calls `std.native(...)`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use glob::Pattern;
use jsonnetunit_fetch::RemoteFetcher;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::NativeError;

pub type NativeResult = std::result::Result<Value, NativeError>;

type NativeFn = Box<dyn Fn(&[Value]) -> NativeResult + Send + Sync>;

/// A host function exposed to the evaluator under a fixed name and arity.
pub struct NativeFunction {
    name: String,
    params: Vec<String>,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new<F>(name: &str, params: &[&str], func: F) -> Self
    where
        F: Fn(&[Value]) -> NativeResult + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names, in call order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Invoke with already-decoded arguments. The count must match `params`.
    pub fn call(&self, args: &[Value]) -> NativeResult {
        if args.len() != self.params.len() {
            return Err(NativeError::Arity {
                function: self.name.clone(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        debug!(native = %self.name, "native call");
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Function table handed to the evaluator on every call.
///
/// Entries are reference counted so an evaluator can bind them into its own
/// callback table for the duration of one evaluation.
#[derive(Debug, Default)]
pub struct NativeRegistry {
    functions: BTreeMap<String, Arc<NativeFunction>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four host capabilities: `fetch`, `parseJson`, `regexMatch`, `importDir`.
    pub fn standard(fetcher: Arc<RemoteFetcher>) -> Self {
        let mut registry = Self::new();

        registry.register(NativeFunction::new("fetch", &["url"], move |args| {
            let url = str_arg("fetch", "url", &args[0])?;
            fetch_text(&fetcher, url).map(Value::String)
        }));

        registry.register(NativeFunction::new("parseJson", &["json"], |args| {
            let text = str_arg("parseJson", "json", &args[0])?;
            parse_json(text)
        }));

        registry.register(NativeFunction::new(
            "regexMatch",
            &["regex", "str"],
            |args| {
                let pattern = str_arg("regexMatch", "regex", &args[0])?;
                let haystack = str_arg("regexMatch", "str", &args[1])?;
                regex_match(pattern, haystack).map(Value::Bool)
            },
        ));

        registry.register(NativeFunction::new(
            "importDir",
            &["thisFile", "glob"],
            |args| {
                let this_file = str_arg("importDir", "thisFile", &args[0])?;
                let pattern = str_arg("importDir", "glob", &args[1])?;
                import_dir(Path::new(this_file), pattern).map(Value::Object)
            },
        ));

        registry
    }

    /// Install `function`, replacing and returning any previous one of the same name.
    pub fn register(&mut self, function: NativeFunction) -> Option<Arc<NativeFunction>> {
        self.functions.insert(function.name.clone(), Arc::new(function))
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name).map(Arc::as_ref)
    }

    /// Owned handle to `name`, for evaluators that outlive the borrow.
    pub fn shared(&self, name: &str) -> Option<Arc<NativeFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn call(&self, name: &str, args: &[Value]) -> NativeResult {
        self.get(name)
            .ok_or_else(|| NativeError::UnknownFunction(name.to_string()))?
            .call(args)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeFunction> {
        self.functions.values().map(Arc::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn str_arg<'a>(function: &str, param: &str, value: &'a Value) -> Result<&'a str, NativeError> {
    value.as_str().ok_or_else(|| NativeError::InvalidArgument {
        function: function.to_string(),
        param: param.to_string(),
        expected: "string",
    })
}

/// Fetch `url` through the cache and return the body as text.
pub fn fetch_text(fetcher: &RemoteFetcher, url: &str) -> Result<String, NativeError> {
    let data = fetcher.fetch(url)?;
    String::from_utf8(data).map_err(|_| NativeError::InvalidUtf8 {
        url: url.to_string(),
    })
}

/// Decode a JSON document into a value tree.
pub fn parse_json(text: &str) -> NativeResult {
    Ok(serde_json::from_str(text)?)
}

/// Whether `haystack` contains a match for `pattern` (unanchored).
pub fn regex_match(pattern: &str, haystack: &str) -> Result<bool, NativeError> {
    Ok(Regex::new(pattern)?.is_match(haystack))
}

/// Read every file matching `pattern`, resolved against the directory that
/// contains `this_file`, into a map of base file name to contents.
///
/// No matches yields an empty map. Matched directories are skipped.
pub fn import_dir(this_file: &Path, pattern: &str) -> Result<Map<String, Value>, NativeError> {
    let base = this_file.parent().unwrap_or_else(|| Path::new(""));
    let full = if base.as_os_str().is_empty() {
        pattern.to_string()
    } else {
        format!(
            "{}/{}",
            Pattern::escape(&base.to_string_lossy()),
            pattern
        )
    };

    let mut contents = Map::new();
    for entry in glob::glob(&full)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(NativeError::Read {
                    path,
                    source: e.into_error(),
                });
            }
        };
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|source| NativeError::Read { path: path.clone(), source })?;
        contents.insert(name, Value::String(text));
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(args: &[Value]) -> NativeResult {
        Ok(args[0].clone())
    }

    #[test]
    fn test_register_and_call() {
        let mut registry = NativeRegistry::new();
        registry.register(NativeFunction::new("echo", &["x"], echo));
        assert_eq!(registry.call("echo", &[json!(42)]).unwrap(), json!(42));
    }

    #[test]
    fn test_register_overwrites_same_name() {
        let mut registry = NativeRegistry::new();
        assert!(registry
            .register(NativeFunction::new("f", &["x"], echo))
            .is_none());
        let previous = registry.register(NativeFunction::new("f", &[], |_| Ok(json!("v2"))));
        assert_eq!(previous.unwrap().params(), ["x"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.call("f", &[]).unwrap(), json!("v2"));
    }

    #[test]
    fn test_unknown_function() {
        let registry = NativeRegistry::new();
        let err = registry.call("nope", &[]).unwrap_err();
        assert!(matches!(err, NativeError::UnknownFunction(_)));
    }

    #[test]
    fn test_arity_is_enforced() {
        let mut registry = NativeRegistry::new();
        registry.register(NativeFunction::new("echo", &["x"], echo));
        let err = registry.call("echo", &[]).unwrap_err();
        assert!(matches!(
            err,
            NativeError::Arity {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_regex_match_is_unanchored() {
        assert!(regex_match("b+", "abbbc").unwrap());
        assert!(!regex_match("^b", "abc").unwrap());
        assert!(regex_match("^[a-z]+$", "abc").unwrap());
    }

    #[test]
    fn test_regex_match_invalid_pattern() {
        let err = regex_match("(unclosed", "x").unwrap_err();
        assert!(matches!(err, NativeError::Regex(_)));
    }

    #[test]
    fn test_parse_json_malformed() {
        let err = parse_json("{\"a\":").unwrap_err();
        assert!(matches!(err, NativeError::Json(_)));
    }

    #[test]
    fn test_import_dir_empty_match() {
        let dir = tempfile::tempdir().unwrap();
        let this_file = dir.path().join("main.libsonnet");
        let map = import_dir(&this_file, "*.json").unwrap();
        assert!(map.is_empty());
    }
}
