//! # Introspection Session
//!
//! [`Session`] is the entry point of the core. It owns the host backend, the
//! type registry and the values rendered so far, and answers the requests a
//! debugger frontend sends while the inferior is stopped:
//!
//! - [`Session::fetch_variables`]: locals, the last function result and watch
//!   expressions, rendered as [`Record`]s
//! - [`Session::expand`]: children of a value rendered by an earlier fetch
//! - evaluation helpers: [`Session::parse_and_evaluate`],
//!   [`Session::call_method`], [`Session::set_value`], ...
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut session = Session::new(backend, DumperConfig::from_env());
//!
//! let response = session.fetch_variables(&FetchRequest::default());
//! for record in &response.data {
//!     println!("{} = {:?}", record.name, record.value);
//! }
//! ```
//!
//! ## Thread Safety
//!
//! A session is driven by one request at a time and every request takes
//! `&mut self`. Share it between threads behind a `Mutex`.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::DumperConfig;
use crate::error::{LensError, NativeResult, Result};
use crate::format::{Formatter, Record};
use crate::native::NativeDebugger;
use crate::types::{Address, TypeHandle, TypeRegistry};
use crate::value::{InternalPath, ScratchBuffer, Value, ValueBuilder};

/// Compiler-generated symbols never listed as locals.
const HIDDEN_LOCALS: [&str; 2] = ["__in_chrg", "__PRETTY_FUNCTION__"];

/// A request for the variables of the selected frame.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest
{
    /// `local.<name>[@<n>]` to refresh a single variable, `None` for all
    pub partial_variable: Option<String>,
    /// Paths whose children should be listed
    pub expanded: HashSet<InternalPath>,
    /// Watch expressions, reported as `watch.<index>`
    pub watchers: Vec<String>,
    /// Name of the value returned by the last finished function call
    pub result_variable: Option<String>,
    /// Per-request override of [`DumperConfig::use_dynamic_type`]
    pub use_dynamic_type: Option<bool>,
}

/// A type first seen while answering a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo
{
    pub name: String,
    pub size: u64,
}

/// Answer to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse
{
    pub data: Vec<Record>,
    #[serde(rename = "typeinfo")]
    pub type_info: Vec<TypeInfo>,
    pub partial: bool,
}

/// Value introspection over one debugged inferior.
pub struct Session<N: NativeDebugger>
{
    native: N,
    types: TypeRegistry<N>,
    config: DumperConfig,
    values: HashMap<InternalPath, Value>,
}

impl<N: NativeDebugger> fmt::Debug for Session<N>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Session")
            .field("types", &self.types.len())
            .field("config", &self.config)
            .field("values", &self.values.len())
            .finish_non_exhaustive()
    }
}

impl<N: NativeDebugger> Session<N>
{
    pub fn new(native: N, config: DumperConfig) -> Self
    {
        Self {
            native,
            types: TypeRegistry::new(),
            config,
            values: HashMap::new(),
        }
    }

    /// Host backend.
    pub fn native(&self) -> &N
    {
        &self.native
    }

    pub fn types(&self) -> &TypeRegistry<N>
    {
        &self.types
    }

    pub fn config(&self) -> &DumperConfig
    {
        &self.config
    }

    pub fn set_config(&mut self, config: DumperConfig)
    {
        self.config = config;
    }

    /// Forget all cached types and rendered values, e.g. after the target
    /// restarted.
    pub fn reset(&mut self)
    {
        info!("Resetting introspection session");
        self.types.clear();
        self.values.clear();
    }

    /// Evaluate an expression in the selected frame.
    ///
    /// ## Errors
    ///
    /// - `Evaluation`: the host rejected the expression
    /// - `ValueBuild`: the result could not be converted
    pub fn evaluate(&mut self, expression: &str) -> Result<Value>
    {
        self.evaluate_with(expression, self.config.use_dynamic_type)
    }

    fn evaluate_with(&mut self, expression: &str, use_dynamic_type: bool) -> Result<Value>
    {
        let raw = self.native.evaluate(expression).map_err(|err| LensError::Evaluation {
            expression: expression.to_owned(),
            reason: err.to_string(),
        })?;
        ValueBuilder::new(&self.native).build(&mut self.types, &raw, use_dynamic_type)
    }

    /// Evaluate an expression, logging and swallowing failures.
    pub fn parse_and_evaluate(&mut self, expression: &str) -> Option<Value>
    {
        match self.evaluate(expression) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Cannot evaluate '{expression}': {err}");
                None
            }
        }
    }

    /// Copy `value` into freshly allocated inferior memory.
    ///
    /// The memory is released when the returned guard is dropped.
    ///
    /// ## Errors
    ///
    /// - `Native`: the content of the value cannot be read
    /// - `Resource`: the inferior cannot allocate
    pub fn poke_value(&self, value: &Value) -> Result<ScratchBuffer<'_, N>>
    {
        let bytes = value.read_bytes(&self.native, &self.types)?;
        ScratchBuffer::new(&self.native, &bytes)
    }

    /// Call `function(args)` on the object `value`.
    ///
    /// Values without an address are copied to scratch memory for the duration
    /// of the call.
    ///
    /// ## Errors
    ///
    /// - `Resource`: scratch memory could not be allocated
    /// - `Evaluation`: the call failed
    /// - `ValueBuild`: the result could not be converted
    pub fn call_method(&mut self, value: &Value, function: &str, args: &[&str]) -> Result<Value>
    {
        let (address, scratch) = match value.address() {
            Some(address) => (address, None),
            None => {
                let bytes = value.read_bytes(&self.native, &self.types)?;
                let scratch = ScratchBuffer::new(&self.native, &bytes)?;
                (scratch.address(), Some(scratch))
            }
        };

        let expression = format!(
            "(({}*){address})->{function}({})",
            quote_scoped(self.types.get(value.ty()).name()),
            join_arguments(args)
        );
        debug!("Calling {expression}");

        let raw = self.native.evaluate(&expression).map_err(|err| LensError::Evaluation {
            expression: expression.clone(),
            reason: err.to_string(),
        })?;
        let result = ValueBuilder::new(&self.native).build(&mut self.types, &raw, self.config.use_dynamic_type);

        if let Some(scratch) = scratch {
            if let Err(err) = scratch.release() {
                warn!("{err}");
            }
        }
        result
    }

    /// Expression denoting `value` in place: `(*(::Type*)(0xADDR))`.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the value has no address
    pub fn make_expression(&self, value: &Value) -> Result<String>
    {
        let address = value
            .address()
            .ok_or_else(|| LensError::InvalidArgument("cannot name a value without an address".to_owned()))?;
        Ok(format!("(*(::{}*)({address}))", self.types.get(value.ty()).name()))
    }

    /// Write a textual value of type `type_name` at `address`.
    ///
    /// ## Errors
    ///
    /// - `Native`: the host could not write
    pub fn set_value(&self, address: Address, type_name: &str, value: &str) -> Result<()>
    {
        debug!("Writing {type_name} {value} at {address}");
        Ok(self.native.write_value(address, type_name, value)?)
    }

    /// Write consecutive `values` of type `type_name` starting at `address`.
    ///
    /// ## Errors
    ///
    /// - `Native`: the host could not write
    pub fn set_values<T: fmt::Display>(&self, address: Address, type_name: &str, values: &[T]) -> Result<()>
    {
        let array_type = format!("{type_name}[{}]", values.len());
        let mut initializer = String::from("{");
        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                initializer.push(',');
            }
            let _ = write!(initializer, "{value}");
        }
        initializer.push('}');
        self.set_value(address, &array_type, &initializer)
    }

    /// Assign `value` to the lvalue `expression`.
    ///
    /// ## Errors
    ///
    /// - `Native`: the host rejected the assignment
    pub fn assign_value(&self, expression: &str, value: &str) -> Result<()>
    {
        debug!("Assigning ({expression})={value}");
        Ok(self.native.assign(expression, value)?)
    }

    /// `0xADDR <symbol>` when the host knows the address, `0xADDR` otherwise.
    pub fn pretty_symbol(&self, address: Address) -> String
    {
        match self.native.symbol_at(address) {
            Some(symbol) => format!("{address} <{symbol}>"),
            None => address.to_string(),
        }
    }

    /// Most-derived class name of the polymorphic object at `address`, read from
    /// the symbol of its vtable pointer.
    pub fn dynamic_type_name(&self, address: Address) -> Option<String>
    {
        let width = usize::try_from(self.native.pointer_size()).ok()?;
        let vptr = match self.native.read_memory(address, width) {
            Ok(bytes) => Address::from_le_bytes(&bytes),
            Err(err) => {
                trace!("No vtable pointer at {address}: {err}");
                return None;
            }
        };
        let symbol = self.native.symbol_at(vptr)?;
        parse_vtable_symbol(&symbol).map(str::to_owned)
    }

    /// Find a type by spelled name.
    pub fn lookup_type(&mut self, name: &str) -> Option<TypeHandle>
    {
        self.types.lookup(&self.native, name)
    }

    /// Local variables and arguments of the selected frame, innermost scope
    /// first.
    ///
    /// A declaration shadowed by `n` inner ones of the same name is listed as
    /// `name@n`. With `partial`, only the variable with exactly that name is
    /// listed.
    pub fn list_locals(&mut self, partial: Option<&str>) -> Vec<Value>
    {
        self.collect_locals(partial.map(LocalName::parse), self.config.use_dynamic_type)
    }

    fn collect_locals(&mut self, partial: Option<LocalName<'_>>, use_dynamic_type: bool) -> Vec<Value>
    {
        let scopes = match self.native.frame_scopes() {
            Ok(scopes) => scopes,
            Err(err) => {
                debug!("Frame block not accessible: {err}");
                return Vec::new();
            }
        };

        let mut declared: HashMap<&str, usize> = HashMap::new();
        let mut locals = Vec::new();
        for (index, scope) in scopes.iter().enumerate() {
            for symbol in &scope.symbols {
                let name = symbol.name.as_str();
                if !(symbol.is_variable || symbol.is_argument) || HIDDEN_LOCALS.contains(&name) {
                    continue;
                }
                let count = declared.entry(name).or_default();
                let local = LocalName { name, shadowed: *count };
                *count += 1;
                if partial.is_some_and(|wanted| wanted != local) {
                    continue;
                }

                let listed = local.to_string();
                match self.read_local(local, index, use_dynamic_type) {
                    Some(value) => locals.push(value.with_iname(InternalPath::local(&listed)).with_name(listed)),
                    None => debug!("Skipping unreadable local {listed}"),
                }
            }
            if scope.is_function {
                break;
            }
        }
        locals
    }

    /// Scoped read, then unscoped read, then evaluation of the bare name.
    ///
    /// A shadowed declaration is only read in its own scope; the fallbacks
    /// would find the innermost one.
    fn read_local(&mut self, local: LocalName<'_>, scope: usize, use_dynamic_type: bool) -> Option<Value>
    {
        let native = &self.native;
        let name = local.name;
        let reads: [&dyn Fn() -> NativeResult<N::Value>; 3] = [
            &|| native.read_variable(name, Some(scope)),
            &|| native.read_variable(name, None),
            &|| native.evaluate(name),
        ];
        let attempts = if local.shadowed == 0 { reads.len() } else { 1 };

        for read in reads.into_iter().take(attempts) {
            let built = read()
                .map_err(LensError::from)
                .and_then(|raw| ValueBuilder::new(native).build(&mut self.types, &raw, use_dynamic_type));
            match built {
                Ok(value) => return Some(value),
                Err(err) => trace!("Reading {name} failed: {err}"),
            }
        }
        None
    }

    /// Answer a variables request for the selected frame.
    pub fn fetch_variables(&mut self, request: &FetchRequest) -> FetchResponse
    {
        let partial = request.partial_variable.as_deref().and_then(partial_name);
        let use_dynamic_type = request.use_dynamic_type.unwrap_or(self.config.use_dynamic_type);
        debug!("Fetching variables (partial: {partial:?})");

        if partial.is_none() {
            self.values.clear();
        }

        let mut roots: Vec<std::result::Result<Value, Record>> =
            self.collect_locals(partial, use_dynamic_type).into_iter().map(Ok).collect();

        if let Some(result) = request.result_variable.as_deref().filter(|name| !name.is_empty()) {
            // Supplementary only; ignore when the result is gone
            match self.evaluate_with(result, use_dynamic_type) {
                Ok(value) => roots.push(Ok(value.with_name(result).with_iname(InternalPath::result(result)))),
                Err(err) => warn!("Cannot evaluate '{result}': {err}"),
            }
        }

        for (index, expression) in request.watchers.iter().enumerate() {
            let iname = InternalPath::watch(index);
            roots.push(match self.evaluate_with(expression, use_dynamic_type) {
                Ok(value) => Ok(value.with_name(expression.as_str()).with_iname(iname)),
                Err(err) => {
                    debug!("Watch {iname} failed: {err}");
                    Err(Record::unavailable(iname, expression.as_str()))
                }
            });
        }

        let mut formatter = Formatter::new(&self.native, &mut self.types, &self.config);
        let data = roots
            .into_iter()
            .map(|root| match root {
                Ok(value) => formatter.render(&value, &request.expanded, self.config.max_depth),
                Err(unavailable) => unavailable,
            })
            .collect();
        let rendered = formatter.take_rendered();
        self.values.extend(rendered);

        let type_info = self
            .types
            .take_types_to_report()
            .into_iter()
            .map(|(name, handle)| TypeInfo {
                size: self.types.byte_size(handle),
                name,
            })
            .collect();

        FetchResponse {
            data,
            type_info,
            partial: partial.is_some(),
        }
    }

    /// A value rendered by an earlier request.
    pub fn value_at_path(&self, path: &InternalPath) -> Option<&Value>
    {
        self.values.get(path)
    }

    /// Render a previously fetched value with its children listed.
    pub fn expand(&mut self, path: &InternalPath) -> Option<Record>
    {
        let value = self.values.get(path)?.clone();
        let expanded = HashSet::from([path.clone()]);

        let mut formatter = Formatter::new(&self.native, &mut self.types, &self.config);
        let record = formatter.render(&value, &expanded, self.config.max_depth.max(1));
        let rendered = formatter.take_rendered();
        self.values.extend(rendered);
        Some(record)
    }
}

/// A local declaration, `shadowed` by that many inner ones of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocalName<'a>
{
    name: &'a str,
    shadowed: usize,
}

impl<'a> LocalName<'a>
{
    /// `abc@2` → the declaration of `abc` behind two inner ones.
    fn parse(listed: &'a str) -> Self
    {
        match listed.split_once('@') {
            Some((name, shadowed)) => Self {
                name,
                shadowed: shadowed.parse().unwrap_or(0),
            },
            None => Self {
                name: listed,
                shadowed: 0,
            },
        }
    }
}

impl fmt::Display for LocalName<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.shadowed {
            0 => f.write_str(self.name),
            n => write!(f, "{}@{n}", self.name),
        }
    }
}

/// Variable of a partial request: `local.abc@2` → `abc` behind two inner
/// declarations.
fn partial_name(spec: &str) -> Option<LocalName<'_>>
{
    if spec.is_empty() {
        return None;
    }
    let listed = spec.split('.').nth(1).unwrap_or(spec);
    Some(LocalName::parse(listed)).filter(|local| !local.name.is_empty())
}

/// Class name in a `vtable for <class> + <offset>` symbol.
fn parse_vtable_symbol(symbol: &str) -> Option<&str>
{
    const PREFIX: &str = "vtable for ";
    let start = symbol.find(PREFIX)? + PREFIX.len();
    let rest = &symbol[start..];
    let end = rest.find(" +")?;
    Some(&rest[..end])
}

/// Scoped names are quoted so the host parses them as one type.
fn quote_scoped(type_name: &str) -> String
{
    if type_name.contains(':') {
        format!("'{type_name}'")
    } else {
        type_name.to_owned()
    }
}

fn join_arguments(args: &[&str]) -> String
{
    args.iter()
        .map(|arg| {
            if arg.contains(':') && !arg.contains('\'') {
                format!("'{arg}'")
            } else {
                (*arg).to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_partial_name()
    {
        let local = |name, shadowed| Some(LocalName { name, shadowed });
        assert_eq!(partial_name("local.abc"), local("abc", 0));
        assert_eq!(partial_name("local.abc@2"), local("abc", 2));
        assert_eq!(partial_name("local.s.a"), local("s", 0));
        assert_eq!(partial_name("local.@1"), None);
        assert_eq!(partial_name(""), None);
        assert_eq!(LocalName { name: "abc", shadowed: 2 }.to_string(), "abc@2");
    }

    #[test]
    fn test_parse_vtable_symbol()
    {
        assert_eq!(parse_vtable_symbol("vtable for Derived + 16"), Some("Derived"));
        assert_eq!(parse_vtable_symbol("vtable for ns::Impl<int> + 16 in section .data"), Some("ns::Impl<int>"));
        assert_eq!(parse_vtable_symbol("main + 4"), None);
        assert_eq!(parse_vtable_symbol("vtable for Broken"), None);
    }

    #[test]
    fn test_call_arguments()
    {
        assert_eq!(join_arguments(&[]), "");
        assert_eq!(join_arguments(&["1", "ns::Mode"]), "1,'ns::Mode'");
        assert_eq!(join_arguments(&["'a:b'"]), "'a:b'");
        assert_eq!(quote_scoped("std::string"), "'std::string'");
        assert_eq!(quote_scoped("Foo"), "Foo");
    }
}
