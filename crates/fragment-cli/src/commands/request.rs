//! Building a [`FragmentRequest`] from flags and an optional request file

use fragment_core::FragmentRequest;
use fragment_fs::ConfigStore;

use crate::cli::RequestArgs;
use crate::error::Result;

/// Merge `args` over the request file named by `--request`, if any.
///
/// Missing required fields are left empty so the controller reports them as
/// contract violations.
pub fn build_request(args: &RequestArgs) -> Result<FragmentRequest> {
    let mut request = match &args.request {
        Some(file) => {
            tracing::debug!(file = %file.display(), "Loading request file");
            ConfigStore::new().load::<FragmentRequest>(file)?
        }
        None => FragmentRequest::present("", "", ""),
    };

    if let Some(path) = &args.path {
        request.path = path.clone();
    }
    if let Some(id) = &args.id {
        request.id = id.clone();
    }
    if let Some(payload) = &args.payload {
        request.payload = payload.clone();
    }
    if args.absent {
        request.should_exist = false;
    }
    if args.top {
        request.format.top_style = true;
    }
    if let Some(style) = &args.comment_style {
        request.format.comment_style = style.clone();
    }
    if let Some(label) = &args.label {
        request.format.label = label.clone();
    }
    if let Some(pattern) = &args.replace_pattern {
        request.format.replace_pattern = Some(pattern.clone());
    }
    if let Some(pattern) = &args.good_pattern {
        request.format.good_pattern = Some(pattern.clone());
    }
    request.attrs.extend(args.attrs.iter().cloned());

    Ok(request)
}
