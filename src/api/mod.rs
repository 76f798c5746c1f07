pub mod batch;
pub mod items;
pub mod settings;

pub use batch::{analyze_batch, export_batch, process_batch, AnalyzeParams};
pub use batch::{__path_analyze_batch, __path_export_batch, __path_process_batch};
pub use items::{
    clear_items, delete_item, detect_item_blobs, get_item, get_item_image, list_items,
    retry_item, split_item, update_edits, upload_items,
};
pub use items::{
    ClearResponse, ItemDetail, ItemIds, ItemList, ItemSummary, Region, RegionList, UploadFile,
    UploadRequest,
};
pub use items::{
    __path_clear_items, __path_delete_item, __path_detect_item_blobs, __path_get_item,
    __path_get_item_image, __path_list_items, __path_retry_item, __path_split_item,
    __path_update_edits, __path_upload_items,
};
pub use settings::{get_settings, update_settings, __path_get_settings, __path_update_settings};
