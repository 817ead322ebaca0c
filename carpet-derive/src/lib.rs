//! `#[derive(ParquetRecord)]`: generates `ToParquetRecord`/`FromParquetRecord`
//! impls for a plain struct, so callers don't have to hand-write the
//! column-by-column plumbing `RecordModelBuilder` offers programmatically
//! (§4.1, §9 "supplemented feature").
//!
//! Struct-level attribute:
//!
//! - `#[parquet(naming = "field_name" | "snake_case")]` — how a field's
//!   column name is derived when it has no `rename`. Defaults to
//!   `field_name` (the identifier unchanged); `snake_case` runs it through
//!   `carpet_core::naming::camel_case_to_snake_case`.
//!
//! Field attributes, all under `#[parquet(...)]`:
//!
//! - `rename = "..."` — use a different Parquet column name than the field
//!   identifier.
//! - `not_null` — treat an `Option<T>` field as required; writing `None`
//!   is then a write-time `CarpetError::DataValidation`.
//! - `json` / `bson` — annotate a `String`/`Vec<u8>` field as `Json`/`Bson`
//!   rather than plain text/bytes.
//! - `enum_like(variants = "A,B,C")` — annotate a `String` field as
//!   `EnumLike` with the given allowed values.
//! - `geometry(crs = "...")`, `geography(crs = "...", edge_algorithm = "...")`
//!   — annotate a `Vec<u8>` field accordingly.
//! - `precision = N, scale = M` — required on an `i128` field, selects
//!   `FieldType::Decimal`.
//! - `rounding = "half_up"` — optional, alongside `precision`/`scale`;
//!   selects the `RoundingMode` used when a write needs to rescale an
//!   `i128` decimal into fewer fractional digits than it carries. One of
//!   `up`, `down`, `ceiling`, `floor`, `half_up`, `half_down`, `half_even`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Lit, Meta, PathArguments, Type};

#[proc_macro_derive(ParquetRecord, attributes(parquet))]
pub fn derive_parquet_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldAttrs {
    rename: Option<String>,
    not_null: bool,
    json: bool,
    bson: bool,
    enum_variants: Option<Vec<String>>,
    geometry_crs: Option<Option<String>>,
    geography: Option<(Option<String>, Option<String>)>,
    precision: Option<u32>,
    scale: Option<u32>,
    rounding: Option<String>,
}

impl Default for FieldAttrs {
    fn default() -> Self {
        FieldAttrs {
            rename: None,
            not_null: false,
            json: false,
            bson: false,
            enum_variants: None,
            geometry_crs: None,
            geography: None,
            precision: None,
            scale: None,
            rounding: None,
        }
    }
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("parquet") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                attrs.rename = Some(lit_str(meta.value()?.parse()?)?);
            } else if meta.path.is_ident("not_null") {
                attrs.not_null = true;
            } else if meta.path.is_ident("json") {
                attrs.json = true;
            } else if meta.path.is_ident("bson") {
                attrs.bson = true;
            } else if meta.path.is_ident("precision") {
                attrs.precision = Some(lit_str(meta.value()?.parse()?)?.parse().map_err(|_| {
                    meta.error("`precision` must parse as an unsigned integer")
                })?);
            } else if meta.path.is_ident("scale") {
                attrs.scale = Some(lit_str(meta.value()?.parse()?)?.parse().map_err(|_| {
                    meta.error("`scale` must parse as an unsigned integer")
                })?);
            } else if meta.path.is_ident("rounding") {
                attrs.rounding = Some(lit_str(meta.value()?.parse()?)?);
            } else if meta.path.is_ident("enum_like") {
                let mut variants = None;
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("variants") {
                        let raw = lit_str(inner.value()?.parse()?)?;
                        variants = Some(raw.split(',').map(|s| s.trim().to_string()).collect());
                    }
                    Ok(())
                })?;
                attrs.enum_variants = Some(variants.unwrap_or_default());
            } else if meta.path.is_ident("geometry") {
                let mut crs = None;
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("crs") {
                        crs = Some(lit_str(inner.value()?.parse()?)?);
                    }
                    Ok(())
                })?;
                attrs.geometry_crs = Some(crs);
            } else if meta.path.is_ident("geography") {
                let mut crs = None;
                let mut edge_algorithm = None;
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("crs") {
                        crs = Some(lit_str(inner.value()?.parse()?)?);
                    } else if inner.path.is_ident("edge_algorithm") {
                        edge_algorithm = Some(lit_str(inner.value()?.parse()?)?);
                    }
                    Ok(())
                })?;
                attrs.geography = Some((crs, edge_algorithm));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// Parse the struct-level `#[parquet(naming = "field_name" | "snake_case")]`
/// attribute, defaulting to `ColumnNamingStrategy::FieldName` when absent.
/// Resolved here, at macro expansion time, rather than through a runtime
/// `WriterConfig`: by the time a caller holds one, the derived
/// `record_descriptor()` has already fixed every column's name.
fn parse_struct_naming(attrs: &[syn::Attribute]) -> syn::Result<carpet_core::naming::ColumnNamingStrategy> {
    let mut naming = carpet_core::naming::ColumnNamingStrategy::default();
    for attr in attrs {
        if !attr.path().is_ident("parquet") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("naming") {
                let value = lit_str(meta.value()?.parse()?)?;
                naming = match value.as_str() {
                    "field_name" => carpet_core::naming::ColumnNamingStrategy::FieldName,
                    "snake_case" => carpet_core::naming::ColumnNamingStrategy::SnakeCase,
                    other => {
                        return Err(meta.error(format!(
                            "unknown `naming` value `{other}`; expected `field_name` or `snake_case`"
                        )))
                    }
                };
            }
            Ok(())
        })?;
    }
    Ok(naming)
}

fn lit_str(lit: Lit) -> syn::Result<String> {
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn rounding_mode_ident(ty: &Type, mode: &str) -> syn::Result<proc_macro2::Ident> {
    let name = match mode {
        "up" => "Up",
        "down" => "Down",
        "ceiling" => "Ceiling",
        "floor" => "Floor",
        "half_up" => "HalfUp",
        "half_down" => "HalfDown",
        "half_even" => "HalfEven",
        other => {
            return Err(syn::Error::new_spanned(
                ty,
                format!(
                    "unknown `rounding` value `{other}`; expected one of up, down, ceiling, floor, half_up, half_down, half_even"
                ),
            ))
        }
    };
    Ok(format_ident!("{}", name))
}

/// Strip one layer of `Option<...>` if present, reporting whether it was.
fn unwrap_option(ty: &Type) -> (bool, &Type) {
    if let Type::Path(p) = ty {
        if let Some(seg) = p.path.segments.last() {
            if seg.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &seg.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (true, inner);
                    }
                }
            }
        }
    }
    (false, ty)
}

/// The last path segment's identifier and its single generic argument, if
/// any (e.g. `Vec<i32>` -> ("Vec", Some(i32))).
fn path_shape(ty: &Type) -> Option<(&syn::Ident, Vec<&Type>)> {
    let Type::Path(p) = ty else { return None };
    let seg = p.path.segments.last()?;
    let args = match &seg.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|a| match a {
                GenericArgument::Type(t) => Some(t),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some((&seg.ident, args))
}

fn ident_name(ty: &Type) -> Option<String> {
    path_shape(ty).map(|(ident, _)| ident.to_string())
}

/// Build the `FieldType` constructor expression for a (non-`Option`) Rust
/// type, honoring the field's attributes where they apply.
fn field_type_expr(ty: &Type, attrs: &FieldAttrs) -> syn::Result<TokenStream2> {
    if let Some((ident, args)) = path_shape(ty) {
        let name = ident.to_string();
        match name.as_str() {
            "Vec" if is_u8(args.first()) => return Ok(opaque_binary_expr(attrs)),
            "Vec" => {
                let inner = args.first().ok_or_else(|| {
                    syn::Error::new_spanned(ty, "Vec field needs an element type")
                })?;
                let inner_expr = field_nested_expr(inner)?;
                return Ok(quote! {
                    carpet_core::FieldType::List(Box::new(#inner_expr))
                });
            }
            "HashSet" | "BTreeSet" => {
                let inner = args.first().ok_or_else(|| {
                    syn::Error::new_spanned(ty, "set field needs an element type")
                })?;
                let inner_expr = field_nested_expr(inner)?;
                return Ok(quote! {
                    carpet_core::FieldType::Set(Box::new(#inner_expr))
                });
            }
            "HashMap" | "BTreeMap" | "IndexMap" => {
                let key = args
                    .first()
                    .ok_or_else(|| syn::Error::new_spanned(ty, "map field needs a key type"))?;
                let value = args
                    .get(1)
                    .ok_or_else(|| syn::Error::new_spanned(ty, "map field needs a value type"))?;
                let key_expr = field_nested_expr(key)?;
                let value_expr = field_nested_expr(value)?;
                return Ok(quote! {
                    carpet_core::FieldType::Map(Box::new(#key_expr), Box::new(#value_expr))
                });
            }
            "String" => {
                if let Some(variants) = &attrs.enum_variants {
                    return Ok(quote! { carpet_core::FieldType::EnumLike(vec![#(#variants.to_string()),*]) });
                }
                if attrs.json {
                    return Ok(quote! {
                        carpet_core::FieldType::BinaryString(carpet_core::StringLogicalType::Json)
                    });
                }
                return Ok(quote! {
                    carpet_core::FieldType::BinaryString(carpet_core::StringLogicalType::Plain)
                });
            }
            "bool" => return Ok(quote! { carpet_core::FieldType::Bool }),
            "i8" => return Ok(quote! { carpet_core::FieldType::Int8 }),
            "i16" => return Ok(quote! { carpet_core::FieldType::Int16 }),
            "i32" => return Ok(quote! { carpet_core::FieldType::Int32 }),
            "i64" => return Ok(quote! { carpet_core::FieldType::Int64 }),
            "f32" => return Ok(quote! { carpet_core::FieldType::Float32 }),
            "f64" => return Ok(quote! { carpet_core::FieldType::Float64 }),
            "Uuid" => return Ok(quote! { carpet_core::FieldType::Uuid }),
            "i128" => {
                let precision = attrs.precision.ok_or_else(|| {
                    syn::Error::new_spanned(ty, "an i128 decimal field needs #[parquet(precision = N, scale = M)]")
                })?;
                if precision == 0 || precision > carpet_core::field::MAX_DECIMAL_PRECISION {
                    return Err(syn::Error::new_spanned(
                        ty,
                        format!(
                            "decimal precision must be between 1 and {}, got {precision}",
                            carpet_core::field::MAX_DECIMAL_PRECISION
                        ),
                    ));
                }
                let scale = attrs.scale.unwrap_or(0);
                let spec = quote! {
                    carpet_core::DecimalSpec::new(#precision, #scale)
                        .expect("precision already validated by the derive macro")
                };
                let spec = match &attrs.rounding {
                    Some(mode) => {
                        let mode_ident = rounding_mode_ident(ty, mode)?;
                        quote! { #spec.with_rounding(carpet_core::RoundingMode::#mode_ident) }
                    }
                    None => spec,
                };
                return Ok(quote! { carpet_core::FieldType::Decimal(#spec) });
            }
            "Date" => return Ok(quote! { carpet_core::FieldType::DateOnly }),
            "Time" => return Ok(quote! { carpet_core::FieldType::TimeOfDay }),
            "DateTime" => return Ok(quote! { carpet_core::FieldType::LocalTimestamp }),
            "Timestamp" => return Ok(quote! { carpet_core::FieldType::InstantTimestamp }),
            _ => {}
        }
    }

    if attrs.bson {
        return Ok(opaque_binary_expr(attrs));
    }
    if let Some((crs, edge_algorithm)) = &attrs.geography {
        let crs_expr = opt_string_expr(crs);
        let edge_expr = opt_string_expr(edge_algorithm);
        return Ok(quote! {
            carpet_core::FieldType::OpaqueBinary(carpet_core::BinaryLogicalType::Geography {
                crs: #crs_expr,
                edge_algorithm: #edge_expr,
            })
        });
    }
    if let Some(crs) = &attrs.geometry_crs {
        let crs_expr = opt_string_expr(crs);
        return Ok(quote! {
            carpet_core::FieldType::OpaqueBinary(carpet_core::BinaryLogicalType::Geometry { crs: #crs_expr })
        });
    }

    // Anything else is assumed to be a nested record type implementing
    // ToParquetRecord/FromParquetRecord.
    Ok(quote! { carpet_core::FieldType::Record(<#ty as carpet_core::ToParquetRecord>::record_descriptor()) })
}

fn opaque_binary_expr(attrs: &FieldAttrs) -> TokenStream2 {
    if attrs.bson {
        quote! { carpet_core::FieldType::OpaqueBinary(carpet_core::BinaryLogicalType::Bson) }
    } else if attrs.json {
        quote! { carpet_core::FieldType::OpaqueBinary(carpet_core::BinaryLogicalType::Json) }
    } else {
        quote! { carpet_core::FieldType::OpaqueBinary(carpet_core::BinaryLogicalType::Plain) }
    }
}

fn opt_string_expr(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote! { Some(#s.to_string()) },
        None => quote! { None },
    }
}

fn is_u8(ty: Option<&&Type>) -> bool {
    matches!(ty.and_then(|t| ident_name(t)).as_deref(), Some("u8"))
}

/// A nested `Field` (element/key/value type for `List`/`Set`/`Map`), whose
/// own nullability comes from whether it is itself `Option<...>`.
fn field_nested_expr(ty: &Type) -> syn::Result<TokenStream2> {
    let (nullable, inner) = unwrap_option(ty);
    let type_expr = field_type_expr(inner, &FieldAttrs::default())?;
    Ok(quote! { carpet_core::Field::new("element", #type_expr, #nullable) })
}

/// Build the expression converting `&self.<field>` into a `ParquetValue`
/// (for a non-`Option`, already-unwrapped Rust type).
fn to_value_expr(ty: &Type, attrs: &FieldAttrs, access: &TokenStream2) -> syn::Result<TokenStream2> {
    if let Some((ident, args)) = path_shape(ty) {
        match ident.to_string().as_str() {
            "Vec" if is_u8(args.first()) => {
                return Ok(quote! {
                    carpet_core::ParquetValue::Bytes(carpet_core::reexports::bytes::Bytes::from(#access.clone()))
                })
            }
            "Vec" => {
                let inner = args[0];
                let (nullable, inner_ty) = unwrap_option(inner);
                let elem_expr = element_to_value_expr(inner_ty, nullable, quote! { item })?;
                return Ok(quote! {
                    carpet_core::ParquetValue::List(#access.iter().map(|item| #elem_expr).collect())
                });
            }
            "HashSet" | "BTreeSet" => {
                let inner = args[0];
                let (nullable, inner_ty) = unwrap_option(inner);
                let elem_expr = element_to_value_expr(inner_ty, nullable, quote! { item })?;
                return Ok(quote! {
                    carpet_core::ParquetValue::List(#access.iter().map(|item| #elem_expr).collect())
                });
            }
            "HashMap" | "BTreeMap" | "IndexMap" => {
                let key_ty = args[0];
                let (value_nullable, value_ty) = unwrap_option(args[1]);
                let key_expr = element_to_value_expr(key_ty, false, quote! { k })?;
                let value_expr = element_to_value_expr(value_ty, value_nullable, quote! { v })?;
                return Ok(quote! {
                    carpet_core::ParquetValue::Map(#access.iter().map(|(k, v)| (#key_expr, #value_expr)).collect())
                });
            }
            "String" => return Ok(quote! { carpet_core::ParquetValue::String(std::sync::Arc::from(#access.as_str())) }),
            "bool" => return Ok(quote! { carpet_core::ParquetValue::Boolean(*#access) }),
            "i8" => return Ok(quote! { carpet_core::ParquetValue::Int8(*#access) }),
            "i16" => return Ok(quote! { carpet_core::ParquetValue::Int16(*#access) }),
            "i32" => return Ok(quote! { carpet_core::ParquetValue::Int32(*#access) }),
            "i64" => return Ok(quote! { carpet_core::ParquetValue::Int64(*#access) }),
            "f32" => return Ok(quote! {
                carpet_core::ParquetValue::Float32(carpet_core::reexports::ordered_float::OrderedFloat(*#access))
            }),
            "f64" => return Ok(quote! {
                carpet_core::ParquetValue::Float64(carpet_core::reexports::ordered_float::OrderedFloat(*#access))
            }),
            "Uuid" => return Ok(quote! { carpet_core::ParquetValue::Uuid(*#access.as_bytes()) }),
            "i128" => {
                let scale = attrs.scale.unwrap_or(0) as i8;
                return Ok(quote! { carpet_core::ParquetValue::Decimal128(*#access, #scale) });
            }
            "Date" => return Ok(quote! {
                carpet_core::ParquetValue::Date32(carpet_core::temporal::date_to_days(*#access))
            }),
            "Time" => return Ok(quote! {
                carpet_core::ParquetValue::TimeMicros(carpet_core::temporal::time_to_micros(*#access))
            }),
            "DateTime" => return Ok(quote! {
                carpet_core::ParquetValue::TimestampMicros(carpet_core::temporal::datetime_to_micros(*#access), None)
            }),
            "Timestamp" => return Ok(quote! {
                carpet_core::ParquetValue::TimestampMicros(
                    carpet_core::temporal::instant_to_micros(*#access),
                    Some(std::sync::Arc::from("UTC")),
                )
            }),
            _ => {}
        }
    }
    Ok(quote! { carpet_core::record_to_value(#access) })
}

fn element_to_value_expr(ty: &Type, nullable: bool, item_access: TokenStream2) -> syn::Result<TokenStream2> {
    let value_expr = to_value_expr(ty, &FieldAttrs::default(), &item_access)?;
    if nullable {
        Ok(quote! {
            match #item_access {
                Some(#item_access) => #value_expr,
                None => carpet_core::ParquetValue::Null,
            }
        })
    } else {
        Ok(value_expr)
    }
}

/// Build the expression converting an owned `ParquetValue` into the
/// (non-`Option`, already-unwrapped) Rust type, returning `Result<T>`.
fn from_value_expr(ty: &Type, attrs: &FieldAttrs, value_access: &TokenStream2) -> syn::Result<TokenStream2> {
    if let Some((ident, args)) = path_shape(ty) {
        match ident.to_string().as_str() {
            "Vec" if is_u8(args.first()) => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Bytes(b) => Ok(b.to_vec()),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected bytes, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "Vec" => {
                let inner = args[0];
                let (nullable, inner_ty) = unwrap_option(inner);
                let elem_expr = element_from_value_expr(inner_ty, nullable)?;
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::List(items) => items
                            .into_iter()
                            .map(|item| #elem_expr)
                            .collect::<carpet_core::Result<Vec<_>>>(),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a list, found {}", other.type_name()
                        ))),
                    }
                });
            }
            "HashSet" | "BTreeSet" => {
                let collection_ty = ident.to_string();
                let inner = args[0];
                let (nullable, inner_ty) = unwrap_option(inner);
                let elem_expr = element_from_value_expr(inner_ty, nullable)?;
                let collect_target = format_ident!("{}", collection_ty);
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::List(items) => items
                            .into_iter()
                            .map(|item| #elem_expr)
                            .collect::<carpet_core::Result<std::collections::#collect_target<_>>>(),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a list, found {}", other.type_name()
                        ))),
                    }
                });
            }
            "HashMap" | "BTreeMap" | "IndexMap" => {
                let collect_target = format_ident!("{}", ident.to_string());
                let collect_path: TokenStream2 = if collect_target == "IndexMap" {
                    quote! { carpet_core::reexports::indexmap::IndexMap }
                } else {
                    quote! { std::collections::#collect_target }
                };
                let key_ty = args[0];
                let (value_nullable, value_ty) = unwrap_option(args[1]);
                let key_expr = element_from_value_expr(key_ty, false)?;
                let value_expr = element_from_value_expr(value_ty, value_nullable)?;
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Map(entries) => entries
                            .into_iter()
                            .map(|(k, v)| {
                                let key = { let item = k; #key_expr }?;
                                let value = { let item = v; #value_expr }?;
                                Ok((key, value))
                            })
                            .collect::<carpet_core::Result<#collect_path<_, _>>>(),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a map, found {}", other.type_name()
                        ))),
                    }
                });
            }
            "String" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::String(s) => Ok(s.to_string()),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a string, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "bool" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Boolean(b) => Ok(b),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a bool, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "i8" => return Ok(int_from_value(value_access, "Int8")),
            "i16" => return Ok(int_from_value(value_access, "Int16")),
            "i32" => return Ok(int_from_value(value_access, "Int32")),
            "i64" => return Ok(int_from_value(value_access, "Int64")),
            "f32" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Float32(f) => Ok(f.0),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a Float32, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "f64" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Float64(f) => Ok(f.0),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a Float64, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "Uuid" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Uuid(bytes) => {
                            Ok(carpet_core::reexports::uuid::Uuid::from_bytes(bytes))
                        }
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a UUID, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "i128" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Decimal128(v, _) => Ok(v),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a Decimal128, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "Date" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::Date32(d) => Ok(carpet_core::temporal::days_to_date(d)),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a Date32, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "Time" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::TimeMicros(t) => Ok(carpet_core::temporal::micros_to_time(t)),
                        carpet_core::ParquetValue::TimeMillis(t) => Ok(carpet_core::temporal::millis_to_time(t)),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a time of day, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "DateTime" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::TimestampMicros(t, _) => Ok(carpet_core::temporal::micros_to_datetime(t)),
                        carpet_core::ParquetValue::TimestampMillis(t, _) => Ok(carpet_core::temporal::micros_to_datetime(t * 1000)),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected a local timestamp, found {}", other.type_name()
                        ))),
                    }
                })
            }
            "Timestamp" => {
                return Ok(quote! {
                    match #value_access {
                        carpet_core::ParquetValue::TimestampMicros(t, _) => Ok(carpet_core::temporal::micros_to_instant(t)),
                        carpet_core::ParquetValue::TimestampMillis(t, _) => Ok(carpet_core::temporal::micros_to_instant(t * 1000)),
                        other => Err(carpet_core::CarpetError::conversion(format!(
                            "expected an instant timestamp, found {}", other.type_name()
                        ))),
                    }
                })
            }
            _ => {}
        }
    }
    let _ = attrs;
    Ok(quote! { carpet_core::value_to_record::<#ty>(#value_access) })
}

fn int_from_value(value_access: &TokenStream2, variant: &str) -> TokenStream2 {
    let variant_ident = format_ident!("{}", variant);
    quote! {
        match #value_access {
            carpet_core::ParquetValue::#variant_ident(v) => Ok(v),
            other => Err(carpet_core::CarpetError::conversion(format!(
                "expected an {}, found {}", stringify!(#variant_ident), other.type_name()
            ))),
        }
    }
}

fn element_from_value_expr(ty: &Type, nullable: bool) -> syn::Result<TokenStream2> {
    let item_expr = from_value_expr(ty, &FieldAttrs::default(), &quote! { item })?;
    if nullable {
        Ok(quote! {
            match item {
                carpet_core::ParquetValue::Null => Ok(None),
                item => (#item_expr).map(Some),
            }
        })
    } else {
        Ok(item_expr)
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let naming = parse_struct_naming(&input.attrs)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input, "ParquetRecord can only be derived for structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(&input, "ParquetRecord requires named fields"));
    };

    let mut field_descriptor_exprs = Vec::new();
    let mut to_value_exprs = Vec::new();
    let mut from_value_stmts = Vec::new();
    let mut field_idents = Vec::new();

    for field in &fields.named {
        let ident = field.ident.as_ref().expect("named field");
        field_idents.push(ident.clone());

        let attrs = parse_field_attrs(field)?;
        let (is_option, inner_ty) = unwrap_option(&field.ty);
        let nullable = is_option && !attrs.not_null;

        let column_name = attrs.rename.clone().unwrap_or_else(|| naming.apply(&ident.to_string()));
        let type_expr = field_type_expr(inner_ty, &attrs)?;
        field_descriptor_exprs.push(quote! {
            carpet_core::Field::new(#column_name, #type_expr, #nullable)
        });

        // `to_value_expr` always receives a `&T` token: either `value` bound
        // by match ergonomics below, or an explicit `&self.field` reference.
        // Keeping that convention uniform lets every leaf arm in
        // `to_value_expr` dereference its access once instead of having to
        // know whether the caller already held a reference.
        let access = quote! { self.#ident };
        let inner_to_value = if is_option {
            let value_access = quote! { value };
            let inner_expr = to_value_expr(inner_ty, &attrs, &value_access)?;
            quote! {
                match &#access {
                    Some(value) => #inner_expr,
                    None => carpet_core::ParquetValue::Null,
                }
            }
        } else {
            let ref_access = quote! { (&#access) };
            to_value_expr(inner_ty, &attrs, &ref_access)?
        };
        to_value_exprs.push(inner_to_value);

        let value_var = format_ident!("__v_{}", ident);
        let from_expr = from_value_expr(inner_ty, &attrs, &quote! { #value_var })?;
        let stmt = if nullable {
            quote! {
                let #value_var = values_iter.next().ok_or_else(|| {
                    carpet_core::CarpetError::internal("not enough values for record fields")
                })?;
                let #ident = match #value_var {
                    carpet_core::ParquetValue::Null => None,
                    #value_var => Some((#from_expr)?),
                };
            }
        } else {
            quote! {
                let #value_var = values_iter.next().ok_or_else(|| {
                    carpet_core::CarpetError::internal("not enough values for record fields")
                })?;
                let #ident = (#from_expr)?;
            }
        };
        from_value_stmts.push(stmt);
    }

    let descriptor_static = format_ident!("__{}_DESCRIPTOR", struct_name.to_string().to_uppercase());

    Ok(quote! {
        impl carpet_core::ToParquetRecord for #struct_name {
            fn record_descriptor() -> std::sync::Arc<carpet_core::RecordDescriptor> {
                static #descriptor_static: std::sync::OnceLock<std::sync::Arc<carpet_core::RecordDescriptor>> =
                    std::sync::OnceLock::new();
                #descriptor_static
                    .get_or_init(|| {
                        std::sync::Arc::new(
                            carpet_core::RecordDescriptor::try_new(
                                #type_name,
                                vec![#(#field_descriptor_exprs),*],
                            )
                            .expect("derived record descriptor is internally consistent"),
                        )
                    })
                    .clone()
            }

            fn to_parquet_values(&self) -> Vec<carpet_core::ParquetValue> {
                vec![#(#to_value_exprs),*]
            }
        }

        impl carpet_core::FromParquetRecord for #struct_name {
            fn record_descriptor() -> std::sync::Arc<carpet_core::RecordDescriptor> {
                <Self as carpet_core::ToParquetRecord>::record_descriptor()
            }

            fn from_parquet_values(values: Vec<carpet_core::ParquetValue>) -> carpet_core::Result<Self> {
                let mut values_iter = values.into_iter();
                #(#from_value_stmts)*
                Ok(Self { #(#field_idents),* })
            }
        }
    })
}
