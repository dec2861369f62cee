// reserved document attributes
pub const DOC_KEY: &str = "_key";
pub const DOC_ID: &str = "_id";
pub const DOC_REV: &str = "_rev";
pub const DOC_OLD_REV: &str = "_oldRev";
pub const SYSTEM_ATTRIBUTES: [&str; 3] = [DOC_KEY, DOC_ID, DOC_REV];

// default database
pub const SYSTEM_DATABASE: &str = "_system";

// api paths
pub const PATH_API_DOCUMENT: &str = "/_api/document";
pub const PATH_API_CURSOR: &str = "/_api/cursor";
pub const PATH_API_TRANSACTION: &str = "/_api/transaction";
pub const PATH_TRANSACTION_BEGIN: &str = "begin";

// request headers
pub const HEADER_TRANSACTION_ID: &str = "x-arango-trx-id";
pub const HEADER_ALLOW_DIRTY_READ: &str = "x-arango-allow-dirty-read";
pub const HEADER_IF_MATCH: &str = "if-match";
pub const HEADER_IF_NONE_MATCH: &str = "if-none-match";

// response headers
pub const HEADER_POTENTIAL_DIRTY_READ: &str = "x-arango-potential-dirty-read";
pub const HEADER_ETAG: &str = "etag";

// query parameters
pub const PARAM_WAIT_FOR_SYNC: &str = "waitForSync";
pub const PARAM_RETURN_NEW: &str = "returnNew";
pub const PARAM_RETURN_OLD: &str = "returnOld";
pub const PARAM_SILENT: &str = "silent";
pub const PARAM_OVERWRITE_MODE: &str = "overwriteMode";
pub const PARAM_KEEP_NULL: &str = "keepNull";
pub const PARAM_MERGE_OBJECTS: &str = "mergeObjects";
pub const PARAM_IGNORE_REVS: &str = "ignoreRevs";
pub const PARAM_VERSION_ATTRIBUTE: &str = "versionAttribute";
pub const PARAM_ONLY_GET: &str = "onlyget";

// response attributes
pub const ATTR_ERROR: &str = "error";
pub const ATTR_CODE: &str = "code";
pub const ATTR_ERROR_NUM: &str = "errorNum";
pub const ATTR_ERROR_MESSAGE: &str = "errorMessage";
pub const ATTR_NEW: &str = "new";
pub const ATTR_OLD: &str = "old";
pub const ATTR_RESULT: &str = "result";

// cursor defaults
pub const DEFAULT_CURSOR_RETRY_BUDGET: u32 = 3;
pub const DEFAULT_SERVER_BATCH_SIZE: usize = 1000;
pub const DEFAULT_CURSOR_TTL_SECS: u64 = 30;
