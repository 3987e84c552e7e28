// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use std::time::Duration;

// Headers used in aws services.
pub const X_AMZ_CONTENT_SHA_256: &str = "x-amz-content-sha256";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

// Headers used by the instance metadata service.
pub const X_AWS_EC2_METADATA_TOKEN: &str = "x-aws-ec2-metadata-token";
pub const X_AWS_EC2_METADATA_TOKEN_TTL_SECONDS: &str = "x-aws-ec2-metadata-token-ttl-seconds";

/// SHA-256 of the empty payload. Every request signed here carries no body.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

// Env values used to configure credential resolution.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_STS_REGIONAL_ENDPOINTS: &str = "AWS_STS_REGIONAL_ENDPOINTS";
pub const STS_ENDPOINT: &str = "STS_ENDPOINT";
pub const AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";
pub const AWS_ROLE_SESSION_NAME: &str = "AWS_ROLE_SESSION_NAME";
pub const AWS_WEB_IDENTITY_TOKEN_FILE: &str = "AWS_WEB_IDENTITY_TOKEN_FILE";
pub const AWS_CONTAINER_CREDENTIALS_RELATIVE_URI: &str = "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";
pub const AWS_EC2_METADATA_SERVICE_ENDPOINT: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";
pub const AWS_CREDENTIALS_TEMP_FILE: &str = "AWS_CREDENTIALS_TEMP_FILE";
pub const TMPDIR: &str = "TMPDIR";
pub const HOSTNAME: &str = "HOSTNAME";
pub const CACHE_INSTANCE_CREDENTIALS_ENABLED: &str = "CACHE_INSTANCE_CREDENTIALS_ENABLED";
pub const GATESIGN_DEBUG: &str = "GATESIGN_DEBUG";

// Defaults.
pub const DEFAULT_TMP_DIR: &str = "/tmp";
pub const DEFAULT_CREDENTIALS_FILE_NAME: &str = "credentials.json";
pub const DEFAULT_ROLE_SESSION_NAME: &str = "gatesign";
pub const DEFAULT_EC2_METADATA_ENDPOINT: &str = "http://169.254.169.254";
pub const ECS_CREDENTIALS_ENDPOINT: &str = "http://169.254.170.2";
pub const GLOBAL_STS_ENDPOINT: &str = "https://sts.amazonaws.com";
pub const STS_API_VERSION: &str = "2011-06-15";

// 21600s (6h) is recommended by AWS.
pub const EC2_METADATA_TOKEN_TTL_SECONDS: &str = "21600";
pub const EC2_METADATA_TOKEN_TTL: Duration = Duration::from_secs(21600);
// The token is fetched again this long before the TTL runs out.
pub const EC2_METADATA_TOKEN_REFRESH_BEFORE: Duration = Duration::from_secs(600);

/// Field of the shared key-value store holding the JSON encoded credential.
pub const SHARED_STORE_CREDENTIAL_KEY: &str = "instance_credential_json";
/// Prefix of the shared key-value store fields holding derived signing keys.
pub const SHARED_STORE_SIGNING_KEY_PREFIX: &str = "signing_key_hash";

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - The forward slash is kept in paths.
pub static AWS_URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html)
///
/// But used in query.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
