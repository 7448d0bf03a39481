//! Virtual host templates

use std::path::PathBuf;
use substore_core::HostLayout;

/// Cipher suites offered for TLSv1.2; TLSv1.3 suites are not configurable in nginx
const TLS_CIPHERS: &str = "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:\
DHE-RSA-AES128-GCM-SHA256:DHE-RSA-AES256-GCM-SHA384";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTemplate {
    pub domain: String,
    pub port: u16,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl SiteTemplate {
    /// Template for `domain` using certbot's certificate paths from `layout`
    pub fn new(domain: &str, port: u16, layout: &HostLayout) -> Self {
        Self {
            domain: domain.to_string(),
            port,
            certificate: layout.fullchain(domain),
            private_key: layout.private_key(domain),
        }
    }

    /// Plain HTTP site proxying everything to the container
    pub fn render_http(&self) -> String {
        format!(
            r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain};

{locations}}}
"#,
            domain = self.domain,
            locations = self.locations(false),
        )
    }

    /// HTTPS site plus a port-80 block redirecting to it
    pub fn render_https(&self) -> String {
        format!(
            r#"server {{
    listen 80;
    listen [::]:80;
    server_name {domain};

    return 301 https://$host$request_uri;
}}

server {{
    listen 443 ssl http2;
    listen [::]:443 ssl http2;
    server_name {domain};

    ssl_certificate {certificate};
    ssl_certificate_key {private_key};

    ssl_protocols TLSv1.2 TLSv1.3;
    ssl_ciphers {ciphers};
    ssl_prefer_server_ciphers off;
    ssl_session_cache shared:SSL:10m;
    ssl_session_timeout 10m;

{locations}}}
"#,
            domain = self.domain,
            certificate = self.certificate.display(),
            private_key = self.private_key.display(),
            ciphers = TLS_CIPHERS,
            locations = self.locations(true),
        )
    }

    fn locations(&self, websocket: bool) -> String {
        let upgrade = if websocket {
            concat!(
                "        proxy_http_version 1.1;\n",
                "        proxy_set_header Upgrade $http_upgrade;\n",
                "        proxy_set_header Connection \"upgrade\";\n",
            )
        } else {
            ""
        };
        format!(
            r#"    location / {{
        proxy_pass http://127.0.0.1:{port};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
{upgrade}    }}

    location /health {{
        access_log off;
        default_type text/plain;
        return 200 "healthy\n";
    }}
"#,
            port = self.port,
            upgrade = upgrade,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(port: u16) -> SiteTemplate {
        SiteTemplate::new("example.com", port, &HostLayout::default())
    }

    #[test]
    fn test_http_proxy_pass_line() {
        let rendered = template(8080).render_http();
        let line = rendered
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("proxy_pass"))
            .unwrap();
        assert_eq!(line, "proxy_pass http://127.0.0.1:8080;");
    }

    #[test]
    fn test_http_site_shape() {
        let rendered = template(3001).render_http();
        assert!(rendered.contains("listen 80;"));
        assert!(rendered.contains("server_name example.com;"));
        assert!(rendered.contains("proxy_set_header Host $host;"));
        assert!(rendered.contains("proxy_set_header X-Real-IP $remote_addr;"));
        assert!(rendered.contains("proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;"));
        assert!(rendered.contains("proxy_set_header X-Forwarded-Proto $scheme;"));
        assert!(rendered.contains("location /health {"));
        assert!(rendered.contains("return 200 \"healthy\\n\";"));
        assert!(!rendered.contains("443"));
        assert!(!rendered.contains("Upgrade"));
    }

    #[test]
    fn test_https_site_shape() {
        let rendered = template(3001).render_https();
        assert!(rendered.contains("return 301 https://$host$request_uri;"));
        assert!(rendered.contains("listen 443 ssl http2;"));
        assert!(rendered
            .contains("ssl_certificate /etc/letsencrypt/live/example.com/fullchain.pem;"));
        assert!(rendered
            .contains("ssl_certificate_key /etc/letsencrypt/live/example.com/privkey.pem;"));
        assert!(rendered.contains("ssl_protocols TLSv1.2 TLSv1.3;"));
        assert!(rendered.contains(&format!("ssl_ciphers {};", TLS_CIPHERS)));
        assert!(rendered.contains("ssl_session_cache shared:SSL:10m;"));
        assert!(rendered.contains("        proxy_set_header Upgrade $http_upgrade;\n"));
        assert!(rendered.contains("        proxy_set_header Connection \"upgrade\";\n"));
        assert!(rendered.contains("proxy_pass http://127.0.0.1:3001;"));
        assert!(rendered.contains("location /health {"));
    }

    #[test]
    fn test_braces_balance() {
        for rendered in [template(3001).render_http(), template(3001).render_https()] {
            let open = rendered.matches('{').count();
            let close = rendered.matches('}').count();
            assert_eq!(open, close, "unbalanced braces in:\n{rendered}");
        }
    }
}
