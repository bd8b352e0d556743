use std::env;

fn main() {
    // Build-time defaults for the factory settings record. When unset, the
    // appliance boots into soft-AP provisioning mode (empty SSID).

    if let Ok(ssid) = env::var("WIFI_SSID") {
        println!("cargo:rustc-env=WIFI_SSID={}", ssid);
        println!("cargo:warning=Using WIFI_SSID from environment: {}", ssid);
    } else {
        println!("cargo:rustc-env=WIFI_SSID=");
    }

    if let Ok(key) = env::var("WIFI_KEY") {
        println!("cargo:rustc-env=WIFI_KEY={}", key);
        println!("cargo:warning=Using WIFI_KEY from environment (hidden)");
    } else {
        println!("cargo:rustc-env=WIFI_KEY=");
    }

    if let Ok(name) = env::var("HOST_NAME") {
        println!("cargo:rustc-env=HOST_NAME={}", name);
    } else {
        println!("cargo:rustc-env=HOST_NAME=embernet");
    }

    if let Ok(server) = env::var("NTP_SERVER") {
        println!("cargo:rustc-env=NTP_SERVER={}", server);
    } else {
        println!("cargo:rustc-env=NTP_SERVER=pool.ntp.org");
    }

    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_KEY");
    println!("cargo:rerun-if-env-changed=HOST_NAME");
    println!("cargo:rerun-if-env-changed=NTP_SERVER");
}
