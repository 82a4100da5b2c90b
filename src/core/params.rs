use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    convert::{TryFrom, TryInto},
    path::Path,
};

use anyhow::Context;

/// Flat JSON object read as typed key/value pairs.
///
/// Every successful getter marks its key as visited so that
/// [`InputParams::check_unused_keys`] can report typos in a config file.
pub struct InputParams {
    params: HashMap<String, InputParamsValue>,
    name: Cow<'static, str>,
    visited_names: HashSet<String>,
}

pub enum InputParamsValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Array(Vec<InputParamsValue>),
}

macro_rules! params_get {
    ( $( ( $name:ident, $type:ty, $variant:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[allow(dead_code)]
                pub fn [<get_ $name>](&mut self, key: &str) -> anyhow::Result<$type> {
                    if let Some(value) = self.params.get(key) {
                        if let InputParamsValue::$variant(value) = value {
                            self.visited_names.insert(key.to_owned());
                            return Ok(*value);
                        }
                        anyhow::bail!("{} - '{}' should be {}", self.name, key, $hint);
                    }
                    anyhow::bail!("{} - there is no '{}' field", self.name, key);
                }

                /// Like the plain getter, but a missing key yields `fallback`.
                /// A present key of the wrong type is still an error.
                #[allow(dead_code)]
                pub fn [<get_ $name _or>](&mut self, key: &str, fallback: $type) -> anyhow::Result<$type> {
                    if self.contains_key(key) {
                        self.[<get_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

impl InputParams {
    pub fn from_json_str(name: &'static str, json: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context(format!("{} - invalid json", name))?;
        let mut params = InputParams::try_from(value)?;
        params.set_name(name.into());
        Ok(params)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json_file = std::fs::File::open(path)
            .context(format!("can't open config file '{}'", path.display()))?;
        let json_reader = std::io::BufReader::new(json_file);
        let value: serde_json::Value = serde_json::from_reader(json_reader)
            .context(format!("can't parse config file '{}'", path.display()))?;
        let mut params = InputParams::try_from(value)?;
        params.set_name(Cow::Owned(path.display().to_string()));
        Ok(params)
    }

    pub fn set_name(&mut self, name: Cow<'static, str>) {
        self.name = name;
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    params_get! {
        (int, i32, Int, "integer"),
        (float, f32, Float, "float"),
        (bool, bool, Bool, "boolean"),
    }

    #[allow(dead_code)]
    pub fn get_str(&mut self, key: &str) -> anyhow::Result<String> {
        if let Some(value) = self.params.get(key) {
            if let InputParamsValue::String(value) = value {
                self.visited_names.insert(key.to_owned());
                return Ok(value.clone());
            }
            anyhow::bail!("{} - '{}' should be string", self.name, key);
        }
        anyhow::bail!("{} - there is no '{}' field", self.name, key);
    }

    /// Keys never read by a getter. Keys starting with `#` are comments.
    pub fn unused_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .params
            .keys()
            .filter(|k| !k.starts_with('#') && !self.visited_names.contains(*k))
            .map(|k| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn check_unused_keys(&self) {
        for k in self.unused_keys() {
            log::warn!("{} - unused key '{}'", self.name, k);
        }
    }
}

impl TryFrom<serde_json::Value> for InputParamsValue {
    type Error = anyhow::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => {
                anyhow::bail!("can't convert to InputParamsValue from null json")
            }
            serde_json::Value::Bool(v) => Ok(Self::Bool(v)),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    let v = i32::try_from(v).context("integer out of range")?;
                    Ok(Self::Int(v))
                } else {
                    let v = v.as_f64().context("number is not representable")?;
                    Ok(Self::Float(v as f32))
                }
            }
            serde_json::Value::String(v) => Ok(Self::String(v)),
            serde_json::Value::Array(arr) => {
                let mut values = Vec::<InputParamsValue>::with_capacity(arr.len());
                for v in arr {
                    match v.try_into() {
                        Ok(v) => values.push(v),
                        Err(e) => anyhow::bail!("can't convert array element: {}", e),
                    }
                }
                Ok(Self::Array(values))
            }
            serde_json::Value::Object(_) => {
                anyhow::bail!("can't convert to InputParamsValue from object json")
            }
        }
    }
}

impl TryFrom<serde_json::Value> for InputParams {
    type Error = anyhow::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        if let serde_json::Value::Object(value) = value {
            let mut params = HashMap::<String, InputParamsValue>::with_capacity(value.len());
            for (k, v) in value {
                match v.try_into() {
                    Ok(v) => {
                        params.insert(k, v);
                    }
                    Err(e) => anyhow::bail!("can't convert member '{}': {}", k, e),
                }
            }
            Ok(Self {
                params,
                name: Cow::Borrowed("params"),
                visited_names: HashSet::new(),
            })
        } else {
            anyhow::bail!("can't convert to InputParams from non-object json value");
        }
    }
}
