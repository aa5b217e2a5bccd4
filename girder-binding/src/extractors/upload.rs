// Extractors for uploaded files

use super::{ArgumentExtractor, Value};
use crate::context::Context;
use crate::error::ExtractError;
use girder_core::{FileItem, InputStream, TypeInfo};
use std::path::{Path, PathBuf};

/// Where `item` lives on disk. In-memory content is spilled to `directory`
/// and the file is tied to the request context.
fn stored_path(context: &Context, item: &FileItem, directory: &Path) -> Result<PathBuf, girder_core::Error> {
    if let Some(ref path) = item.path {
        return Ok(path.clone());
    }
    let temp = item.spill(directory)?;
    let path = temp.to_path_buf();
    context.hold_temp_file(temp);
    Ok(path)
}

fn upload_error(field: &str, err: girder_core::Error) -> ExtractError {
    ExtractError::Upload {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// The first upload of a field.
#[derive(Debug, Clone)]
pub struct FileItemExtractor {
    field: String,
}

impl FileItemExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl ArgumentExtractor for FileItemExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        Ok(context
            .parameter_as_file_item(&self.field)
            .map(|item| Box::new(item.clone()) as Value))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<FileItem>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// Every upload of a field. Empty when there are none.
#[derive(Debug, Clone)]
pub struct FileItemsExtractor {
    field: String,
}

impl FileItemsExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl ArgumentExtractor for FileItemsExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let items: Vec<FileItem> = context
            .parameter_as_file_items(&self.field)
            .into_iter()
            .cloned()
            .collect();
        Ok(Some(Box::new(items)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<Vec<FileItem>>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// The on-disk path of an upload. In-memory uploads are written to a
/// temporary file in the upload directory, removed with the request context.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    field: String,
    directory: PathBuf,
}

impl FileExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            directory: std::env::temp_dir(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ArgumentExtractor for FileExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let Some(item) = context.parameter_as_file_item(&self.field) else {
            return Ok(None);
        };
        let path = stored_path(context, item, &self.directory)
            .map_err(|e| upload_error(&self.field, e))?;
        Ok(Some(Box::new(path)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<PathBuf>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// On-disk paths of every upload of a field.
#[derive(Debug, Clone)]
pub struct FilesExtractor {
    field: String,
    directory: PathBuf,
}

impl FilesExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            directory: std::env::temp_dir(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }
}

impl ArgumentExtractor for FilesExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let paths = context
            .parameter_as_file_items(&self.field)
            .into_iter()
            .map(|item| stored_path(context, item, &self.directory))
            .collect::<Result<Vec<PathBuf>, _>>()
            .map_err(|e| upload_error(&self.field, e))?;
        Ok(Some(Box::new(paths)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<Vec<PathBuf>>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// A reader over the first upload of a field.
#[derive(Debug, Clone)]
pub struct InputStreamExtractor {
    field: String,
}

impl InputStreamExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl ArgumentExtractor for InputStreamExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let Some(item) = context.parameter_as_file_item(&self.field) else {
            return Ok(None);
        };
        let stream: InputStream = item.open().map_err(|e| upload_error(&self.field, e))?;
        Ok(Some(Box::new(stream)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<InputStream>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// Readers over every upload of a field.
#[derive(Debug, Clone)]
pub struct InputStreamsExtractor {
    field: String,
}

impl InputStreamsExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl ArgumentExtractor for InputStreamsExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let streams = context
            .parameter_as_file_items(&self.field)
            .into_iter()
            .map(FileItem::open)
            .collect::<Result<Vec<InputStream>, _>>()
            .map_err(|e| upload_error(&self.field, e))?;
        Ok(Some(Box::new(streams)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<Vec<InputStream>>()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// The upload extractor replacing a parameter extractor on `declared`, if
/// `declared` is an upload type.
pub(crate) fn for_type(field: &str, declared: &TypeInfo) -> Option<super::BoxedExtractor> {
    let extractor: super::BoxedExtractor =
        if declared.is::<FileItem>() || declared.is::<Option<FileItem>>() {
            Box::new(FileItemExtractor::new(field))
        } else if declared.is::<Vec<FileItem>>() {
            Box::new(FileItemsExtractor::new(field))
        } else if declared.is::<PathBuf>() || declared.is::<Option<PathBuf>>() {
            Box::new(FileExtractor::new(field))
        } else if declared.is::<Vec<PathBuf>>() {
            Box::new(FilesExtractor::new(field))
        } else if declared.is::<InputStream>() || declared.is::<Option<InputStream>>() {
            Box::new(InputStreamExtractor::new(field))
        } else if declared.is::<Vec<InputStream>>() {
            Box::new(InputStreamsExtractor::new(field))
        } else {
            return None;
        };
    Some(extractor)
}
