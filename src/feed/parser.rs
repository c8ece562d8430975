use super::attrs::{mandatory_attribute, mandatory_attribute_or, parse_release_date};
use super::dom::{parse_document, XmlNode};
use crate::model::{
    BuildInfo, BuildNumber, BuildRange, ButtonInfo, ChannelStatus, FeedError, Licensing, OsSuffix,
    PatchInfo, Product, UpdateChannel,
};

/// Parses feed text and resolves the entry for `product_code`.
///
/// Returns `Ok(None)` when no product in the feed lists that code.
pub fn parse_feed(
    content: &str,
    product_code: &str,
    os: OsSuffix,
) -> Result<Option<Product>, FeedError> {
    let root = parse_document(content)?;
    resolve(&root, product_code, os)
}

/// Finds the first `product` child of `root` with a `code` child whose
/// trimmed text equals `product_code` and builds it.
///
/// Matching is exact and case-sensitive. No match is not an error.
pub fn resolve<N: XmlNode>(
    root: &N,
    product_code: &str,
    os: OsSuffix,
) -> Result<Option<Product>, FeedError> {
    let matched = root.children_named("product").into_iter().find(|product| {
        product
            .children_named("code")
            .iter()
            .any(|code| code.text().trim() == product_code)
    });

    match matched {
        Some(node) => {
            let product = parse_product(node, product_code, os)?;
            tracing::debug!(
                code = %product_code,
                name = %product.name,
                channels = product.channels.len(),
                "Resolved product from update feed"
            );
            Ok(Some(product))
        }
        None => {
            tracing::debug!(code = %product_code, "Product not listed in update feed");
            Ok(None)
        }
    }
}

/// Builds a [`Product`] from a `product` element.
///
/// The code comes from the caller, never from the element.
pub fn parse_product<N: XmlNode>(
    node: &N,
    product_code: &str,
    os: OsSuffix,
) -> Result<Product, FeedError> {
    let name = mandatory_attribute(node, "name")?.to_string();
    let disable_machine_id = node.attribute("disableMachineId") == Some("true");

    let channels = node
        .children_named("channel")
        .into_iter()
        .map(|channel| parse_channel(channel, product_code, os))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Product {
        name,
        code: product_code.to_string(),
        channels,
        disable_machine_id,
    })
}

/// Builds an [`UpdateChannel`] from a `channel` element.
pub fn parse_channel<N: XmlNode>(
    node: &N,
    product_code: &str,
    os: OsSuffix,
) -> Result<UpdateChannel, FeedError> {
    let id = mandatory_attribute(node, "id")?;
    if id.is_empty() {
        return Err(FeedError::malformed("<channel> has an empty `id`"));
    }

    let status: ChannelStatus = mandatory_attribute(node, "status")?.parse()?;
    let licensing = Licensing::from_attribute(node.attribute("licensing"));

    let eval_days = match node.attribute("evalDays") {
        Some(raw) => raw.parse::<u32>().map_err(|e| {
            FeedError::malformed(format!(
                "<channel id=\"{id}\"> has invalid evalDays {raw:?}: {e}"
            ))
        })?,
        None => UpdateChannel::DEFAULT_EVAL_DAYS,
    };

    let builds = node
        .children_named("build")
        .into_iter()
        .map(|build| parse_build(build, product_code, os))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UpdateChannel {
        id: id.to_string(),
        status,
        licensing,
        eval_days,
        url: node.attribute("url").map(str::to_string),
        major_version: node.attribute("majorVersion").map(str::to_string),
        builds,
    })
}

/// Builds a [`BuildInfo`] from a `build` element.
///
/// `fullNumber` wins over `number`; numbers without a product code get
/// `product_code`.
pub fn parse_build<N: XmlNode>(
    node: &N,
    product_code: &str,
    os: OsSuffix,
) -> Result<BuildInfo, FeedError> {
    let number = parse_build_number(
        mandatory_attribute_or(node, "fullNumber", "number")?,
        product_code,
    )?;
    let api_version = match node.attribute("apiVersion") {
        Some(raw) => parse_build_number(raw, product_code)?,
        None => number.clone(),
    };

    let message = node
        .child("message")
        .map(|m| m.text().into_owned())
        .unwrap_or_default();
    let blog_post = node
        .child("blogPost")
        .and_then(|b| b.attribute("url"))
        .map(str::to_string);

    let patches = node
        .children_named("patch")
        .into_iter()
        .map(|patch| parse_patch(patch, product_code, os))
        .collect::<Result<Vec<_>, _>>()?;

    let button_nodes = node.children_named("button");
    let download_url = match button_nodes
        .iter()
        .find(|b| b.attribute("download").is_some())
    {
        Some(button) => Some(mandatory_attribute(*button, "url")?.to_string()),
        None => None,
    };
    let buttons = button_nodes
        .iter()
        .map(|b| ButtonInfo {
            name: b.attribute("name").map(str::to_string),
            url: b.attribute("url").map(str::to_string),
            is_download: b.attribute("download").is_some(),
        })
        .collect();

    Ok(BuildInfo {
        number,
        api_version,
        version: node.attribute("version").unwrap_or_default().to_string(),
        message,
        blog_post,
        release_date: parse_release_date(node.attribute("releaseDate")),
        target: parse_target(node)?,
        patches,
        download_url,
        buttons,
    })
}

/// Builds a [`PatchInfo`] from a `patch` element.
///
/// The patch is unavailable when `os` appears in the comma-separated
/// `exclusions` attribute.
pub fn parse_patch<N: XmlNode>(
    node: &N,
    product_code: &str,
    os: OsSuffix,
) -> Result<PatchInfo, FeedError> {
    let from_build = parse_build_number(
        mandatory_attribute_or(node, "fullFrom", "from")?,
        product_code,
    )?;

    let excluded = node.attribute("exclusions").is_some_and(|list| {
        list.split(',')
            .map(str::trim)
            .any(|token| token == os.as_str())
    });

    Ok(PatchInfo {
        from_build,
        size: node.attribute("size").map(str::to_string),
        is_available: !excluded,
    })
}

fn parse_build_number(raw: &str, product_code: &str) -> Result<BuildNumber, FeedError> {
    BuildNumber::parse(raw)
        .map(|number| number.with_product_code(product_code))
        .map_err(|e| FeedError::malformed(format!("invalid build number {raw:?}: {e}")))
}

fn parse_target<N: XmlNode>(node: &N) -> Result<Option<BuildRange>, FeedError> {
    let since = node.attribute("targetSince");
    let until = node.attribute("targetUntil");
    if since.is_none() && until.is_none() {
        return Ok(None);
    }

    let edge = |raw: Option<&str>, attr: &str| {
        raw.map(|raw| {
            BuildNumber::parse(raw)
                .map_err(|e| FeedError::malformed(format!("invalid {attr} {raw:?}: {e}")))
        })
        .transpose()
    };

    Ok(Some(BuildRange::new(
        edge(since, "targetSince")?,
        edge(until, "targetUntil")?,
    )))
}
