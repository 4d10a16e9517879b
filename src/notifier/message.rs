use crate::model::CanonicalOffer;
use crate::utils::escape_html;
use scraper::Html;

/// A rendered notification. `html` uses only the tags Telegram accepts, with newlines for breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub offer_id: u64,
    pub title: String,
    pub url: String,
    pub html: String,
    pub text: String,
    /// Short key/value summary for providers with structured layouts.
    pub fields: Vec<(String, String)>,
}

/// Renders an admitted offer. In verbose mode the raw feed record is appended.
pub fn render(offer: &CanonicalOffer, verbose: bool) -> Message {
    let url = offer.url();
    let price = format!("{:.2}€", offer.price_gross);
    let cpu = format!("{}x {}", offer.cpu_count, offer.cpu_description);

    let mut html = format!(
        "<b>Hetzner</b> server #{id} in {dc} for {price}:\n\
         <b>{ram}GB RAM, {cpu}</b>, {disks}\n\
         <a href=\"{href}\">{link}</a>\n",
        id = offer.id,
        dc = escape_html(&offer.datacenter),
        ram = offer.ram_size,
        cpu = escape_html(&cpu),
        disks = escape_html(&offer.disk_description),
        href = escape_html(&url),
        link = escape_html(&url),
    );
    if verbose {
        html.push_str(&format!(
            "\n<u>Details</u>:\n<pre>{}</pre>\n",
            escape_html(&offer.raw.to_string())
        ));
    }

    Message {
        offer_id: offer.id,
        title: format!("Hetzner server #{} in {} for {}", offer.id, offer.datacenter, price),
        text: html_to_text(&html),
        fields: vec![
            ("Datacenter".into(), offer.datacenter.clone()),
            ("Price".into(), price),
            ("RAM".into(), format!("{}GB ({})", offer.ram_size, offer.ram_description)),
            ("CPU".into(), cpu),
            ("Disks".into(), offer.disk_description.clone()),
        ],
        url,
        html,
    }
}

/// Plain-text rendition of an HTML body: tags dropped, entities decoded.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}
