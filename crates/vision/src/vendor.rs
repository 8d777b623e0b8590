//! Vendor fingerprint catalog used by Discovery (C3) and Probe (C4).
//!
//! Grounded on the original `camera_integration_manager.py`'s
//! `SmartCameraDetector.camera_database` table: one entry per brand family with
//! its candidate ports, HTTP paths, `Server` header substrings, and default
//! stream URL templates.

#[derive(Debug, Clone)]
pub struct VendorProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub ports: &'static [u16],
    pub paths: &'static [&'static str],
    pub header_substrings: &'static [&'static str],
    pub body_substrings: &'static [&'static str],
    pub default_rtsp_template: &'static str,
    pub default_http_template: &'static str,
    pub default_credentials: &'static [(&'static str, &'static str)],
    pub features: &'static [&'static str],
}

impl VendorProfile {
    pub fn default_rtsp_url(&self, ip: &str) -> String {
        self.default_rtsp_template.replace("{ip}", ip)
    }

    pub fn default_http_url(&self, ip: &str) -> String {
        self.default_http_template.replace("{ip}", ip)
    }

    /// More specific profiles (named brand, not the generic catch-all) win
    /// confidence ties per §4.3's "highest-confidence, ties break toward the
    /// more specific profile" rule.
    pub fn specificity(&self) -> u8 {
        if self.key == "generic_ip" {
            0
        } else {
            1
        }
    }
}

pub static VENDOR_PROFILES: &[VendorProfile] = &[
    VendorProfile {
        key: "hikvision",
        name: "Hikvision",
        ports: &[554, 80, 8000, 8080, 443],
        paths: &["/Streaming/Channels/101", "/ISAPI/Streaming/channels/101", "/doc/page/login.asp"],
        header_substrings: &["App-webs/", "uc-httpd"],
        body_substrings: &["hikvision"],
        default_rtsp_template: "rtsp://{ip}:554/Streaming/Channels/101",
        default_http_template: "http://{ip}:80/ISAPI/Streaming/channels/101",
        default_credentials: &[("admin", "12345")],
        features: &["ptz", "audio"],
    },
    VendorProfile {
        key: "dahua",
        name: "Dahua",
        ports: &[554, 80, 37777, 443],
        paths: &["/cam/realmonitor?channel=1&subtype=0", "/cgi-bin/magicBox.cgi"],
        header_substrings: &["DahuaHttp"],
        body_substrings: &["dahua"],
        default_rtsp_template: "rtsp://{ip}:554/cam/realmonitor?channel=1&subtype=0",
        default_http_template: "http://{ip}:80/cgi-bin/magicBox.cgi",
        default_credentials: &[("admin", "admin")],
        features: &["ptz"],
    },
    VendorProfile {
        key: "axis",
        name: "Axis",
        ports: &[554, 80, 443],
        paths: &["/axis-media/media.amp", "/axis-cgi/jpg/image.cgi"],
        header_substrings: &["axis"],
        body_substrings: &["axis"],
        default_rtsp_template: "rtsp://{ip}:554/axis-media/media.amp",
        default_http_template: "http://{ip}:80/axis-cgi/jpg/image.cgi",
        default_credentials: &[("root", "pass")],
        features: &["ptz", "audio"],
    },
    VendorProfile {
        key: "foscam",
        name: "Foscam",
        ports: &[554, 88, 80],
        paths: &["/videoMain", "/videostream.cgi"],
        header_substrings: &["Foscam"],
        body_substrings: &["foscam"],
        default_rtsp_template: "rtsp://{ip}:554/videoMain",
        default_http_template: "http://{ip}:88/videostream.cgi",
        default_credentials: &[("admin", "")],
        features: &["ptz"],
    },
    VendorProfile {
        key: "android_ipwebcam",
        name: "Android IP Webcam",
        ports: &[8080, 8081, 8082],
        paths: &["/shot.jpg", "/video", "/mjpeg"],
        header_substrings: &["IP Webcam"],
        body_substrings: &["ip webcam"],
        default_rtsp_template: "rtsp://{ip}:8080/video",
        default_http_template: "http://{ip}:8080/shot.jpg",
        default_credentials: &[],
        features: &[],
    },
    VendorProfile {
        key: "generic_ip",
        name: "Generic IP Camera",
        ports: &[554, 8080, 80, 8000],
        paths: &["/video", "/stream", "/mjpeg", "/shot.jpg", "/live"],
        header_substrings: &[],
        body_substrings: &[],
        default_rtsp_template: "rtsp://{ip}:554/stream",
        default_http_template: "http://{ip}:8080/video",
        default_credentials: &[],
        features: &[],
    },
];

/// All distinct ports any cataloged vendor might answer on, deduplicated — the
/// set Discovery probes per host.
pub fn all_candidate_ports() -> Vec<u16> {
    let mut ports: Vec<u16> = VENDOR_PROFILES.iter().flat_map(|v| v.ports.iter().copied()).collect();
    ports.sort_unstable();
    ports.dedup();
    ports
}
