//! Purpose: Image store listings and application type provisioning descriptions.
//! Exports: `FileInfo`, `FolderInfo`, `FileVersion`, `ImageStoreContent`,
//! `ProvisionApplicationTypeDescription`, `ApplicationPackageCleanupPolicy`.
//! Role: Wire shapes for `GET /ImageStore/{path}` and `POST /ApplicationTypes/$/Provision`.
use crate::core::schema::{polymorphic, record, wire_enum};
use crate::core::value::NumericString;
use time::OffsetDateTime;

record! {
    pub struct FileVersion {
        optional "VersionNumber" version_number: String,
        optional "EpochDataLossNumber" epoch_data_loss_number: i64 as NumericString,
        optional "EpochConfigurationNumber" epoch_configuration_number: i64 as NumericString,
    }
}

record! {
    pub struct FileInfo {
        optional "FileSize" file_size: u64 as NumericString,
        optional "FileVersion" file_version: FileVersion,
        optional "ModifiedDate" modified_date: OffsetDateTime,
        /// Path relative to the image store root, with `\` separators as the store reports them.
        optional "StoreRelativePath" store_relative_path: String,
    }
}

record! {
    pub struct FolderInfo {
        optional "StoreRelativePath" store_relative_path: String,
        optional "FileCount" file_count: u64 as NumericString,
    }
}

record! {
    pub struct ImageStoreContent {
        optional "StoreFiles" store_files: Vec<FileInfo>,
        optional "StoreFolders" store_folders: Vec<FolderInfo>,
    }
}

impl ImageStoreContent {
    /// Sum of the reported file sizes; files without a size count as zero.
    pub fn total_file_size(&self) -> u64 {
        self.store_files
            .iter()
            .flatten()
            .filter_map(|file| file.file_size)
            .fold(0u64, u64::saturating_add)
    }
}

wire_enum! {
    pub enum ApplicationPackageCleanupPolicy {
        Invalid = "Invalid",
        Default = "Default",
        Automatic = "Automatic",
        Manual = "Manual",
    }
}

record! {
    pub struct ImageStorePathProvision {
        required "Async" is_async: bool,
        required "ApplicationTypeBuildPath" application_type_build_path: String,
        optional "ApplicationPackageCleanupPolicy" application_package_cleanup_policy: ApplicationPackageCleanupPolicy,
    }
}

record! {
    pub struct ExternalStoreProvision {
        required "Async" is_async: bool,
        /// SAS or plain HTTP(S) URI of an `.sfpkg` file.
        required "ApplicationPackageDownloadUri" application_package_download_uri: String,
        required "ApplicationTypeName" application_type_name: String,
        required "ApplicationTypeVersion" application_type_version: String,
    }
}

polymorphic! {
    pub enum ProvisionApplicationTypeDescription tagged "Kind" {
        "ImageStorePath" => ImageStorePath(ImageStorePathProvision),
        "ExternalStore" => ExternalStore(ExternalStoreProvision),
    }
}

impl ProvisionApplicationTypeDescription {
    pub fn image_store_path(build_path: impl Into<String>, is_async: bool) -> Self {
        Self::ImageStorePath(ImageStorePathProvision {
            is_async,
            application_type_build_path: build_path.into(),
            application_package_cleanup_policy: None,
        })
    }

    pub fn is_async(&self) -> bool {
        match self {
            Self::ImageStorePath(provision) => provision.is_async,
            Self::ExternalStore(provision) => provision.is_async,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageStoreContent, ProvisionApplicationTypeDescription};
    use crate::core::codec::{from_value, to_value};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn listing_decodes_numeric_strings_and_dates() {
        let content: ImageStoreContent = from_value(json!({
            "StoreFiles": [
                {
                    "FileSize": "2048",
                    "FileVersion": {
                        "VersionNumber": "1.0",
                        "EpochDataLossNumber": "130",
                        "EpochConfigurationNumber": 8589934592u64
                    },
                    "ModifiedDate": "2024-03-01T08:30:00.000Z",
                    "StoreRelativePath": "Shop\\ApplicationManifest.xml"
                },
                {"FileSize": "100", "StoreRelativePath": "Shop\\Code.zip"}
            ],
            "StoreFolders": [{"StoreRelativePath": "Shop\\Pkg", "FileCount": "12"}]
        }))
        .expect("content");
        assert_eq!(content.total_file_size(), 2148);
        let files = content.store_files.as_ref().expect("files");
        let version = files[0].file_version.as_ref().expect("version");
        assert_eq!(version.epoch_configuration_number, Some(8_589_934_592));
        assert_eq!(
            content.store_folders.as_ref().expect("folders")[0].file_count,
            Some(12)
        );

        let encoded = to_value(&content).expect("encode");
        assert_eq!(encoded["StoreFiles"][0]["FileSize"], json!("2048"));
        assert_eq!(encoded["StoreFiles"][0]["ModifiedDate"], json!("2024-03-01T08:30:00Z"));
    }

    #[test]
    fn modified_date_rejects_garbage() {
        let err = from_value::<ImageStoreContent>(json!({
            "StoreFiles": [{"ModifiedDate": "last tuesday"}]
        }))
        .expect_err("date");
        assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
        assert_eq!(err.path(), Some("$.StoreFiles[0].ModifiedDate"));
    }

    #[test]
    fn provision_writes_kind_then_fields() {
        let body = ProvisionApplicationTypeDescription::image_store_path("Shop", true);
        assert!(body.is_async());
        assert_eq!(
            to_value(&body).expect("encode"),
            json!({"Kind": "ImageStorePath", "Async": true, "ApplicationTypeBuildPath": "Shop"})
        );

        let err = from_value::<ProvisionApplicationTypeDescription>(json!({
            "Kind": "ExternalStore",
            "Async": false,
            "ApplicationTypeName": "ShopType",
            "ApplicationTypeVersion": "1.0",
        }))
        .expect_err("uri");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert_eq!(err.path(), Some("$.ApplicationPackageDownloadUri"));
    }
}
