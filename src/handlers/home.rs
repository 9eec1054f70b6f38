use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};

/// Interactive device-management page. The ingress base path is injected
/// so the embedded script can build relative API URLs behind a
/// reverse-proxy prefix; the default user id is injected so the page
/// registers against the configured identity.
pub fn home(headers: &HeaderMap, user_id: &str) -> Response {
    let ingress_path = headers
        .get("x-ingress-path")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Html(render_page(ingress_path, user_id)).into_response()
}

fn render_page(ingress_path: &str, user_id: &str) -> String {
    PAGE.replace("{{BASE_PATH}}", ingress_path)
        .replace("{{USER_ID}}", user_id)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Emberlink - Device Management</title>
  <style>
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      max-width: 800px;
      margin: 40px auto;
      padding: 0 20px;
      background: #f5f5f5;
    }
    h1 { color: #333; }
    .card {
      background: white;
      padding: 20px;
      border-radius: 8px;
      box-shadow: 0 2px 4px rgba(0,0,0,0.1);
      margin-bottom: 20px;
    }
    .status { color: #4CAF50; font-weight: bold; }
  </style>
</head>
<body>
  <h1>&#127777;&#65039; Emberlink Device Management</h1>

  <div class="card">
    <h2>Welcome!</h2>
    <p class="status">&#10003; MQTT Integration Active</p>
    <p>Your Emberlink server is running and ready to manage thermostats.</p>
  </div>

  <div class="card">
    <h2>Quick Start</h2>
    <ol>
      <li>Generate an entry code for your thermostat</li>
      <li>Enter the code on your device</li>
      <li>Device will appear here automatically</li>
    </ol>
  </div>

  <div class="card">
    <h2>Register Device</h2>
    <p>Enter the 7-character pairing code from your thermostat:</p>
    <form id="registerForm">
      <input
        type="text"
        id="entryCode"
        placeholder="123ABCD"
        maxlength="7"
        style="padding: 10px; font-size: 16px; width: 150px; text-transform: uppercase;"
        required
      />
      <button
        type="submit"
        style="padding: 10px 20px; font-size: 16px; margin-left: 10px; background: #4CAF50; color: white; border: none; border-radius: 4px; cursor: pointer;"
      >
        Register Device
      </button>
    </form>
    <div id="registerResult" style="margin-top: 15px;"></div>
  </div>

  <div class="card">
    <h2>Devices</h2>
    <div id="deviceList">
      <p><em>Loading devices...</em></p>
    </div>
    <button onclick="loadDevices()" style="margin-top: 10px;">Refresh Devices</button>
  </div>

  <script>
    // Ingress base path, injected by the server.
    const BASE_PATH = '{{BASE_PATH}}';

    loadDevices();

    document.getElementById('registerForm').addEventListener('submit', async (e) => {
      e.preventDefault();
      const code = document.getElementById('entryCode').value.toUpperCase().trim();
      const resultDiv = document.getElementById('registerResult');

      if (code.length !== 7) {
        resultDiv.innerHTML = '<p style="color: red;">Entry code must be 7 characters</p>';
        return;
      }

      resultDiv.innerHTML = '<p>Registering device...</p>';

      try {
        const response = await fetch(BASE_PATH + '/api/register', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({
            code: code,
            userId: '{{USER_ID}}'
          })
        });

        const result = await response.json();

        if (result.success) {
          resultDiv.innerHTML = '<p style="color: green;">&#10003; ' + result.message + '</p>';
          document.getElementById('entryCode').value = '';
          setTimeout(loadDevices, 1000);
        } else {
          resultDiv.innerHTML = '<p style="color: red;">&#10007; ' + result.message + '</p>';
        }
      } catch (error) {
        resultDiv.innerHTML = '<p style="color: red;">Error: ' + error.message + '</p>';
      }
    });

    async function loadDevices() {
      const deviceList = document.getElementById('deviceList');
      try {
        const response = await fetch(BASE_PATH + '/api/devices');
        const devices = await response.json();

        if (devices.length === 0) {
          deviceList.innerHTML = '<p><em>No devices registered yet</em></p>';
        } else {
          deviceList.innerHTML = '<ul>' +
            devices.map(d => {
              const date = new Date(d.createdAt);
              return '<li><strong>' + d.serial + '</strong> - Registered ' + date.toLocaleString() + '</li>';
            }).join('') +
            '</ul>';
        }
      } catch (error) {
        deviceList.innerHTML = '<p style="color: red;">Error loading devices</p>';
      }
    }
  </script>
</body>
</html>
"#;
