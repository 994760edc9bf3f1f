//! Compute API operations: servers, volumes and images.

use crate::client::{path_segment, OnlineLabsClient};
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{
    CreateServerRequest, CreateVolumeRequest, ImageResponse, ImagesResponse, ServerAction,
    ServerActionRequest, ServerResponse, ServersResponse, TaskResponse, VolumeResponse,
    VolumesResponse,
};

impl<T: Transport> OnlineLabsClient<T> {
    // --- servers ---

    pub fn build_get_servers(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.compute_url("servers"))
    }

    pub fn build_get_server(&self, server_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.compute_url(&format!("servers/{}", path_segment(server_id))),
        )
    }

    pub fn build_create_server(&self, name: &str, organization: &str, image: &str) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Post,
            self.compute_url("servers"),
            &CreateServerRequest::new(name, organization, image),
        )
    }

    pub fn build_delete_server(&self, server_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            self.compute_url(&format!("servers/{}", path_segment(server_id))),
        )
    }

    pub fn build_perform_server_action(
        &self,
        server_id: &str,
        action: &ServerAction,
    ) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Post,
            self.compute_url(&format!("servers/{}/action", path_segment(server_id))),
            &ServerActionRequest {
                action: action.as_str().to_string(),
            },
        )
    }

    pub fn get_servers(&self) -> Result<ServersResponse> {
        self.fetch(&self.build_get_servers())
    }

    pub fn get_server(&self, server_id: &str) -> Result<ServerResponse> {
        self.fetch(&self.build_get_server(server_id))
    }

    /// Creates a server from `image` in `organization`, tagged `docker-machine`.
    pub fn create_server(&self, name: &str, organization: &str, image: &str) -> Result<ServerResponse> {
        self.fetch(&self.build_create_server(name, organization, image)?)
    }

    pub fn delete_server(&self, server_id: &str) -> Result<()> {
        self.send(&self.build_delete_server(server_id))
    }

    /// Starts `action` on the server and returns the task tracking it.
    pub fn perform_server_action(
        &self,
        server_id: &str,
        action: impl Into<ServerAction>,
    ) -> Result<TaskResponse> {
        self.fetch(&self.build_perform_server_action(server_id, &action.into())?)
    }

    // --- volumes ---

    pub fn build_get_volumes(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.compute_url("volumes"))
    }

    pub fn build_get_volume(&self, volume_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.compute_url(&format!("volumes/{}", path_segment(volume_id))),
        )
    }

    pub fn build_create_volume(
        &self,
        name: &str,
        organization: &str,
        volume_type: &str,
        size: u64,
    ) -> Result<HttpRequest> {
        let payload = CreateVolumeRequest {
            name: name.to_string(),
            organization: organization.to_string(),
            volume_type: volume_type.to_string(),
            size,
        };
        self.json_request(HttpMethod::Post, self.compute_url("volumes"), &payload)
    }

    pub fn build_delete_volume(&self, volume_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            self.compute_url(&format!("volumes/{}", path_segment(volume_id))),
        )
    }

    pub fn get_volumes(&self) -> Result<VolumesResponse> {
        self.fetch(&self.build_get_volumes())
    }

    pub fn get_volume(&self, volume_id: &str) -> Result<VolumeResponse> {
        self.fetch(&self.build_get_volume(volume_id))
    }

    /// `size` is in bytes.
    pub fn create_volume(
        &self,
        name: &str,
        organization: &str,
        volume_type: &str,
        size: u64,
    ) -> Result<VolumeResponse> {
        self.fetch(&self.build_create_volume(name, organization, volume_type, size)?)
    }

    pub fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.send(&self.build_delete_volume(volume_id))
    }

    // --- images ---

    pub fn build_get_images(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.compute_url("images"))
    }

    pub fn build_get_image(&self, image_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.compute_url(&format!("images/{}", path_segment(image_id))),
        )
    }

    pub fn build_delete_image(&self, image_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            self.compute_url(&format!("images/{}", path_segment(image_id))),
        )
    }

    pub fn get_images(&self) -> Result<ImagesResponse> {
        self.fetch(&self.build_get_images())
    }

    pub fn get_image(&self, image_id: &str) -> Result<ImageResponse> {
        self.fetch(&self.build_get_image(image_id))
    }

    pub fn delete_image(&self, image_id: &str) -> Result<()> {
        self.send(&self.build_delete_image(image_id))
    }
}
