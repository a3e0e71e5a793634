//! Layer persistence into the container artefact.

use std::path::{Path, PathBuf};
use std::{fs, io};

use geo::Geometry;
use parkatlas_core::OutputLayer;
use rusqlite::{Connection, Error as SqliteError, params};
use thiserror::Error;

use super::schema::{ContainerSchemaError, create_layer_table, initialise_schema};

/// Destination for geometry-homogeneous layers.
///
/// Writing one layer never corrupts or blocks another layer in the same
/// artefact; each call is atomic.
pub trait LayerSink {
    /// Persist one non-empty layer under its name.
    fn persist_layer(&mut self, layer: &OutputLayer) -> Result<(), ContainerError>;
}

/// SQLite-backed container artefact: one feature table per layer plus the
/// `atlas_layers` manifest.
///
/// # Examples
/// ```
/// use parkatlas_core::{GeometryClass, OutputLayer};
/// use parkatlas_data::container::{AtlasContainer, LayerSink};
/// use tempfile::tempdir;
///
/// # fn example() -> Result<(), parkatlas_data::container::ContainerError> {
/// let dir = tempdir().expect("create temp directory");
/// let path = dir.path().join("parks.sqlite");
/// let mut container = AtlasContainer::create(&path)?;
/// container.persist_layer(&OutputLayer {
///     class: GeometryClass::Point,
///     records: vec![],
/// })?;
/// assert!(container.layer_names()?.is_empty(), "empty layers write nothing");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AtlasContainer {
    connection: Connection,
    location: PathBuf,
}

impl AtlasContainer {
    /// Create (or open) the container at `path` and initialise its schema.
    pub fn create(path: &Path) -> Result<Self, ContainerError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ContainerError::CreateDir {
                source,
                path: parent.to_path_buf(),
            })?;
        }
        let mut connection = Connection::open(path).map_err(|source| ContainerError::Open {
            source,
            path: path.to_path_buf(),
        })?;
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection,
            location: path.to_path_buf(),
        })
    }

    /// Location of the container artefact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.location
    }

    /// Layer names recorded in the manifest, alphabetical.
    pub fn layer_names(&self) -> Result<Vec<String>, ContainerError> {
        let mut statement = self
            .connection
            .prepare("SELECT layer_name FROM atlas_layers ORDER BY layer_name")
            .map_err(|source| ContainerError::Sqlite {
                operation: "prepare manifest query",
                layer: "atlas_layers",
                source,
            })?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|source| ContainerError::Sqlite {
                operation: "read manifest",
                layer: "atlas_layers",
                source,
            })?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(|source| ContainerError::Sqlite {
                operation: "read manifest row",
                layer: "atlas_layers",
                source,
            })?);
        }
        Ok(names)
    }
}

impl LayerSink for AtlasContainer {
    fn persist_layer(&mut self, layer: &OutputLayer) -> Result<(), ContainerError> {
        if layer.records.is_empty() {
            return Ok(());
        }
        let name = layer.name();
        let transaction =
            self.connection
                .transaction()
                .map_err(|source| ContainerError::Sqlite {
                    operation: "begin layer transaction",
                    layer: name,
                    source,
                })?;
        create_layer_table(&transaction, name)?;
        {
            let mut insert = transaction
                .prepare_cached(&format!(
                    "INSERT INTO \"{name}\" (name, country, properties, geometry)
                     VALUES (?1, ?2, ?3, ?4)"
                ))
                .map_err(|source| ContainerError::Sqlite {
                    operation: "prepare feature insert",
                    layer: name,
                    source,
                })?;
            for record in &layer.records {
                let properties = serde_json::to_string(&record.properties)
                    .map_err(|source| ContainerError::EncodeProperties { source })?;
                let geometry = encode_geometry(&record.geometry)?;
                insert
                    .execute(params![
                        record.name,
                        record.country.as_ref(),
                        properties,
                        geometry
                    ])
                    .map_err(|source| ContainerError::Sqlite {
                        operation: "insert feature",
                        layer: name,
                        source,
                    })?;
            }
        }
        transaction
            .execute(
                "INSERT OR REPLACE INTO atlas_layers (layer_name, geometry_class, feature_count)
                 VALUES (?1, ?2, ?3)",
                params![name, layer.class.label(), layer.records.len() as i64],
            )
            .map_err(|source| ContainerError::Sqlite {
                operation: "record layer manifest",
                layer: name,
                source,
            })?;
        transaction
            .commit()
            .map_err(|source| ContainerError::Sqlite {
                operation: "commit layer transaction",
                layer: name,
                source,
            })?;
        Ok(())
    }
}

fn encode_geometry(geometry: &Geometry<f64>) -> Result<String, ContainerError> {
    let encoded = geojson::Geometry::new(geojson::Value::from(geometry));
    serde_json::to_string(&encoded).map_err(|source| ContainerError::EncodeGeometry { source })
}

/// Errors raised when persisting layers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContainerError {
    /// The directory holding the artefact could not be created.
    #[error("failed to create container directory {path:?}: {source}")]
    CreateDir { source: io::Error, path: PathBuf },
    /// The artefact could not be opened.
    #[error("failed to open container at {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: SqliteError,
    },
    /// Schema initialisation failed.
    #[error(transparent)]
    Schema(#[from] ContainerSchemaError),
    /// A SQLite operation failed.
    #[error("failed to {operation} for layer '{layer}'")]
    Sqlite {
        operation: &'static str,
        layer: &'static str,
        #[source]
        source: SqliteError,
    },
    /// A properties map could not be serialised.
    #[error("failed to encode feature properties: {source}")]
    EncodeProperties { source: serde_json::Error },
    /// A geometry could not be serialised.
    #[error("failed to encode feature geometry: {source}")]
    EncodeGeometry { source: serde_json::Error },
}
