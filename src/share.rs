use qrcode::{
    QrCode,
    render::{svg, unicode},
};
use url::Url;

use crate::{error::Result, record::Record};

const QR_SIZE: u32 = 400;
const QR_FILL: &str = "#111111";

/// Everything the share view shows for one record.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareCard {
    pub link: String,
    pub title: String,
    pub svg: String,
}

/// Canonical short link: `<site-root>?d=<human key>`.
pub fn share_link(site_root: &Url, human_key: &str) -> String {
    let mut link = site_root.clone();
    link.set_fragment(None);
    link.set_query(None);
    link.query_pairs_mut().append_pair("d", human_key);
    link.into()
}

pub fn card(site_root: &Url, record: &Record) -> Result<ShareCard> {
    let link = share_link(site_root, &record.human_key);
    Ok(ShareCard {
        svg: qr_svg(&link)?,
        title: record.title.clone(),
        link,
    })
}

pub fn qr_svg(text: &str) -> Result<String> {
    let code = QrCode::new(text.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .dark_color(svg::Color(QR_FILL))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Same code drawn with half-block characters for a terminal.
pub fn qr_terminal(text: &str) -> Result<String> {
    let code = QrCode::new(text.as_bytes())?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
