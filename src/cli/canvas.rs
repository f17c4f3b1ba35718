use crate::{cli::connect, info, success, utils, warning};

pub async fn canvas(track_id: &str, open: bool) {
    let client = connect().await;

    let pb = utils::spinner(format!("Fetching canvas for {}...", track_id));
    let response = client.get_canvas_by_track_id(track_id).await;
    pb.finish_and_clear();

    let Some(url) = response.as_ref().and_then(|r| r.canvas_url()) else {
        warning!("Canvas not available for {}", track_id);
        return;
    };

    success!("Canvas for {}", utils::track_uri(track_id));
    println!("{}", url);

    if open {
        if webbrowser::open(url).is_err() {
            warning!("Cannot open browser. Open the URL above manually.");
        } else {
            info!("Opened canvas in browser");
        }
    }
}
